// src/scanner/mod.rs
// 扫描核心: 调谐 -> 采集 -> 频谱 -> 瀑布图 -> 信道状态
pub mod buffer;
pub mod channel;
pub mod error;
pub mod fft;
pub mod pipeline;
pub mod plot;
pub mod session;
pub mod sink;
pub mod source;
pub mod store;
// 公开导出常用类型, 方便前端调用
pub use buffer::{WaterfallBuffer, WaterfallMatrix};
pub use channel::{Channel, ChannelTable};
pub use error::ScanError;
pub use fft::{frequency_axis, SpectralProcessor, SpectrumLine};
pub use pipeline::{ScanController, ScanReport};
pub use plot::{PlotStyle, PngSink};
pub use session::{ChannelView, ScanSession, ViewData};
pub use sink::{present, DisplaySink};
pub use source::{CaptureDevice, DeviceConfig, GainMode, SampleFrame, ToneSource};
pub use store::{ChannelState, ChannelStore};
