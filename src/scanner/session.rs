use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use log::debug;
use crate::scanner::buffer::WaterfallMatrix;
use crate::scanner::channel::{Channel, ChannelTable};
use crate::scanner::fft::frequency_axis;
use crate::scanner::store::{ChannelState, ChannelStore};
use crate::scanner::ScanError;
/// Currently displayed channel index; always `< len` and wraps on navigation.
pub struct ScanCursor {
    position: AtomicUsize,
    len: usize,
}
impl ScanCursor {
    pub fn new(len: usize) -> Self {
        Self {
            position: AtomicUsize::new(0),
            len,
        }
    }
    pub fn get(&self) -> usize {
        self.position.load(Ordering::SeqCst)
    }
    pub fn next(&self) -> usize {
        self.step(|p, len| (p + 1) % len)
    }
    pub fn previous(&self) -> usize {
        self.step(|p, len| (p + len - 1) % len)
    }
    pub fn jump(&self, index: usize) -> Result<usize, ScanError> {
        if index >= self.len {
            return Err(ScanError::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        self.position.store(index, Ordering::SeqCst);
        Ok(index)
    }
    fn step(&self, f: impl Fn(usize, usize) -> usize) -> usize {
        let len = self.len.max(1);
        let previous = self
            .position
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |p| Some(f(p, len)))
            .unwrap_or_else(|p| p);
        f(previous, len)
    }
}
/// Waterfall plus the axis it must be drawn against.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewData {
    /// Channel never scanned; render a placeholder.
    NoData,
    Waterfall {
        matrix: Arc<WaterfallMatrix>,
        frequency_axis: Vec<f64>,
    },
}
/// Read-only projection of the store at one channel, ready for a display sink.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelView {
    pub index: usize,
    pub channel: Channel,
    pub data: ViewData,
    pub last_scan_failed: bool,
    pub channel_ids: Vec<u32>,
    pub aggregate_vector: Vec<f64>,
    pub scanned: Vec<bool>,
}
impl ChannelView {
    pub fn label(&self) -> String {
        self.channel.label()
    }
}
/// Everything a scan run shares: the fixed table and acquisition geometry,
/// the channel store and the cursor. Built once and handed to the controller
/// and to display adapters.
pub struct ScanSession {
    table: ChannelTable,
    store: ChannelStore,
    cursor: ScanCursor,
    sample_rate_hz: f64,
    frame_size: usize,
    waterfall_depth: usize,
}
impl ScanSession {
    pub fn new(
        table: ChannelTable,
        sample_rate_hz: f64,
        frame_size: usize,
        waterfall_depth: usize,
    ) -> Result<Self, ScanError> {
        if sample_rate_hz <= 0.0 {
            return Err(ScanError::InvalidConfig(
                "sample rate must be greater than zero".into(),
            ));
        }
        if frame_size == 0 || waterfall_depth == 0 {
            return Err(ScanError::InvalidConfig(
                "frame size and waterfall depth must be greater than zero".into(),
            ));
        }
        let count = table.size();
        Ok(Self {
            store: ChannelStore::with_channels(count),
            cursor: ScanCursor::new(count),
            table,
            sample_rate_hz,
            frame_size,
            waterfall_depth,
        })
    }
    pub fn table(&self) -> &ChannelTable {
        &self.table
    }
    pub fn store(&self) -> &ChannelStore {
        &self.store
    }
    pub fn cursor(&self) -> &ScanCursor {
        &self.cursor
    }
    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }
    pub fn waterfall_depth(&self) -> usize {
        self.waterfall_depth
    }
    pub fn frequency_axis(&self, index: usize) -> Result<Vec<f64>, ScanError> {
        let channel = self.table.at(index)?;
        Ok(frequency_axis(
            channel.center_hz,
            self.sample_rate_hz,
            self.frame_size,
        ))
    }
    pub fn current_view(&self) -> ChannelView {
        let index = self.cursor.get();
        // The cursor never leaves the table, so this lookup cannot fail.
        self.view_of(index).unwrap_or_else(|_| self.empty_view(index))
    }
    pub fn view_of(&self, index: usize) -> Result<ChannelView, ScanError> {
        let channel = self.table.at(index)?;
        // One read per slot: data, flags and the bar vector all come from the same states.
        let states = self.store.snapshot();
        let state = states.get(index).cloned().unwrap_or_default();
        debug!("view of {} (scanned: {})", channel.label(), state.is_scanned());
        let data = match state.waterfall {
            Some(matrix) => ViewData::Waterfall {
                matrix,
                frequency_axis: self.frequency_axis(index)?,
            },
            None => ViewData::NoData,
        };
        Ok(ChannelView {
            index,
            channel,
            data,
            last_scan_failed: state.last_scan_failed,
            channel_ids: self.table.ids(),
            aggregate_vector: states.iter().map(ChannelState::display_power).collect(),
            scanned: states.iter().map(ChannelState::is_scanned).collect(),
        })
    }
    fn empty_view(&self, index: usize) -> ChannelView {
        ChannelView {
            index,
            channel: Channel::new(0, 0.0),
            data: ViewData::NoData,
            last_scan_failed: false,
            channel_ids: self.table.ids(),
            aggregate_vector: self.store.aggregate_vector(),
            scanned: vec![false; self.table.size()],
        }
    }
}
