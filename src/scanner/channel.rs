use serde::{Deserialize, Serialize};
use crate::scanner::ScanError;
/// One tunable channel: display id plus centre frequency.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: u32,
    pub center_hz: f64,
}
impl Channel {
    pub fn new(id: u32, center_hz: f64) -> Self {
        Self { id, center_hz }
    }
    pub fn label(&self) -> String {
        format!("CH{}", self.id)
    }
}
/// Ordered, immutable list of channels. Order is display and navigation order.
#[derive(Clone, Debug)]
pub struct ChannelTable {
    channels: Vec<Channel>,
}
impl ChannelTable {
    pub fn new(channels: Vec<Channel>) -> Result<Self, ScanError> {
        if channels.is_empty() {
            return Err(ScanError::InvalidConfig("channel table is empty".into()));
        }
        Ok(Self { channels })
    }
    /// 2.4 GHz Wi-Fi plan: CH1 = 2.412 GHz .. CH13 = 2.472 GHz, 5 MHz apart.
    pub fn wifi_24ghz() -> Self {
        let channels = (0..13u32)
            .map(|i| Channel::new(i + 1, 2.412e9 + i as f64 * 5e6))
            .collect();
        Self { channels }
    }
    pub fn size(&self) -> usize {
        self.channels.len()
    }
    pub fn at(&self, index: usize) -> Result<Channel, ScanError> {
        self.channels
            .get(index)
            .copied()
            .ok_or(ScanError::IndexOutOfRange {
                index,
                len: self.channels.len(),
            })
    }
    pub fn ids(&self) -> Vec<u32> {
        self.channels.iter().map(|c| c.id).collect()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn wifi_plan_matches_channel_raster() {
        let table = ChannelTable::wifi_24ghz();
        assert_eq!(table.size(), 13);
        let first = table.at(0).unwrap();
        let last = table.at(12).unwrap();
        assert_eq!(first.id, 1);
        assert!((first.center_hz - 2.412e9).abs() < 1.0);
        assert_eq!(last.id, 13);
        assert!((last.center_hz - 2.472e9).abs() < 1.0);
        assert_eq!(table.at(6).unwrap().label(), "CH7");
    }
    #[test]
    fn lookup_past_end_is_rejected() {
        let table = ChannelTable::wifi_24ghz();
        match table.at(13) {
            Err(ScanError::IndexOutOfRange { index, len }) => {
                assert_eq!(index, 13);
                assert_eq!(len, 13);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
    #[test]
    fn empty_table_is_invalid() {
        assert!(matches!(
            ChannelTable::new(Vec::new()),
            Err(ScanError::InvalidConfig(_))
        ));
    }
}
