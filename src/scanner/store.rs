use std::sync::{Arc, PoisonError, RwLock};
use crate::scanner::buffer::WaterfallMatrix;
use crate::scanner::ScanError;
/// What is known about one channel. `aggregate_power` only means something
/// while `waterfall` is present.
#[derive(Clone, Debug, Default)]
pub struct ChannelState {
    pub waterfall: Option<Arc<WaterfallMatrix>>,
    pub aggregate_power: f64,
    /// Set when the latest scan attempt failed; the previous waterfall is kept.
    pub last_scan_failed: bool,
}
impl ChannelState {
    pub fn is_scanned(&self) -> bool {
        self.waterfall.is_some()
    }
    /// Aggregate power for display; 0.0 until the channel has a waterfall.
    pub fn display_power(&self) -> f64 {
        if self.is_scanned() {
            self.aggregate_power
        } else {
            0.0
        }
    }
}
/// Per-channel state shared between the scan path (writer) and display path (readers).
///
/// Every write swaps a whole `ChannelState` under that channel's lock, so a
/// reader sees either the old matrix or the new one, never a mix.
pub struct ChannelStore {
    entries: Vec<RwLock<ChannelState>>,
}
impl ChannelStore {
    pub fn with_channels(count: usize) -> Self {
        Self {
            entries: (0..count).map(|_| RwLock::new(ChannelState::default())).collect(),
        }
    }
    /// Unscanned and unknown indices both read as the empty default.
    pub fn get(&self, index: usize) -> ChannelState {
        self.entries
            .get(index)
            .map(|entry| entry.read().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_default()
    }
    pub fn update(&self, index: usize, matrix: WaterfallMatrix) -> Result<(), ScanError> {
        let entry = self.entry(index)?;
        let next = ChannelState {
            aggregate_power: matrix.mean_power(),
            waterfall: Some(Arc::new(matrix)),
            last_scan_failed: false,
        };
        *entry.write().unwrap_or_else(PoisonError::into_inner) = next;
        Ok(())
    }
    /// Flags the latest attempt as failed without touching the stored waterfall.
    pub fn mark_failed(&self, index: usize) -> Result<(), ScanError> {
        let entry = self.entry(index)?;
        entry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .last_scan_failed = true;
        Ok(())
    }
    /// Aggregate power per channel in table order; unscanned channels read 0.0.
    pub fn aggregate_vector(&self) -> Vec<f64> {
        self.snapshot().iter().map(ChannelState::display_power).collect()
    }
    /// Every channel's state, each slot read exactly once.
    pub fn snapshot(&self) -> Vec<ChannelState> {
        self.entries
            .iter()
            .map(|entry| entry.read().unwrap_or_else(PoisonError::into_inner).clone())
            .collect()
    }
    fn entry(&self, index: usize) -> Result<&RwLock<ChannelState>, ScanError> {
        self.entries.get(index).ok_or(ScanError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::buffer::filled_matrix;
    #[test]
    fn unscanned_channel_reads_as_absent() {
        let store = ChannelStore::with_channels(3);
        let state = store.get(1);
        assert!(state.waterfall.is_none());
        assert!(!state.last_scan_failed);
        assert!(store.get(99).waterfall.is_none());
    }
    #[test]
    fn aggregate_is_mean_of_matrix() {
        let store = ChannelStore::with_channels(2);
        store
            .update(1, filled_matrix(5, 8, |r, c| -90.0 + r as f64 - c as f64 * 0.5))
            .unwrap();
        let state = store.get(1);
        let matrix = state.waterfall.as_ref().unwrap();
        let values: Vec<f64> = matrix.values().collect();
        let recomputed = values.iter().sum::<f64>() / values.len() as f64;
        assert!((state.aggregate_power - recomputed).abs() < 1e-9);
        assert_eq!(store.aggregate_vector()[0], 0.0);
        assert!((store.aggregate_vector()[1] - recomputed).abs() < 1e-9);
    }
    #[test]
    fn failure_keeps_previous_matrix() {
        let store = ChannelStore::with_channels(1);
        store.update(0, filled_matrix(2, 2, |_, _| -50.0)).unwrap();
        store.mark_failed(0).unwrap();
        let state = store.get(0);
        assert!(state.last_scan_failed);
        assert_eq!(state.waterfall.unwrap().depth(), 2);
        assert!((state.aggregate_power + 50.0).abs() < 1e-12);
        store.update(0, filled_matrix(2, 2, |_, _| -60.0)).unwrap();
        assert!(!store.get(0).last_scan_failed);
    }
    #[test]
    fn update_out_of_range_is_rejected() {
        let store = ChannelStore::with_channels(1);
        assert!(matches!(
            store.update(4, filled_matrix(1, 1, |_, _| 0.0)),
            Err(ScanError::IndexOutOfRange { index: 4, len: 1 })
        ));
    }
}
