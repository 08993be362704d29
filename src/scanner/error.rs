use thiserror::Error;
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("frame length mismatch: expected {expected} samples, got {actual}")]
    InvalidFrameLength { expected: usize, actual: usize },
    #[error("waterfall buffer already holds {depth} rows")]
    BufferFull { depth: usize },
    #[error("waterfall capture incomplete: {actual} of {expected} rows")]
    IncompleteCapture { expected: usize, actual: usize },
    #[error("channel index {index} out of range (table has {len} channels)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("capture device failure: {0}")]
    CaptureFailure(String),
    #[error("another scan is already running")]
    ScanInProgress,
    #[error("scan of channel index {index} cancelled")]
    Cancelled { index: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to render plot: {0}")]
    Plot(String),
}
impl ScanError {
    /// Device-side errors leave the channel untouched and are collected by a sweep;
    /// everything else points at a bug or a bad configuration.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ScanError::CaptureFailure(_) | ScanError::Cancelled { .. }
        )
    }
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for ScanError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ScanError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for ScanError {
    fn from(value: image::ImageError) -> Self {
        ScanError::Plot(value.to_string())
    }
}
