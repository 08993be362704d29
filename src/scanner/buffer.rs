use ndarray::Array2;
use crate::scanner::fft::SpectrumLine;
use crate::scanner::ScanError;
/// Committed waterfall for one channel: `depth` rows (oldest first) x `frame_size` bins, in dB.
#[derive(Clone, Debug, PartialEq)]
pub struct WaterfallMatrix {
    data: Array2<f64>,
}
impl WaterfallMatrix {
    pub fn depth(&self) -> usize {
        self.data.nrows()
    }
    pub fn frame_size(&self) -> usize {
        self.data.ncols()
    }
    /// The newest spectrum line, i.e. the instantaneous spectrum.
    pub fn latest(&self) -> Option<Vec<f64>> {
        self.depth()
            .checked_sub(1)
            .map(|last| self.data.row(last).to_vec())
    }
    /// Arithmetic mean of every value; NaN for an empty matrix.
    pub fn mean_power(&self) -> f64 {
        self.data.mean().unwrap_or(f64::NAN)
    }
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied()
    }
    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }
}
/// Accumulates spectrum lines for one capture. Nothing is visible outside the
/// buffer until `commit` hands over a complete matrix.
#[derive(Debug)]
pub struct WaterfallBuffer {
    depth: usize,
    frame_size: Option<usize>,
    rows: Vec<SpectrumLine>,
}
impl WaterfallBuffer {
    pub fn begin_capture(depth: usize) -> Self {
        Self {
            depth,
            frame_size: None,
            rows: Vec::with_capacity(depth),
        }
    }
    pub fn append(&mut self, line: SpectrumLine) -> Result<(), ScanError> {
        if self.rows.len() >= self.depth {
            return Err(ScanError::BufferFull { depth: self.depth });
        }
        let expected = *self.frame_size.get_or_insert(line.len());
        if line.len() != expected {
            return Err(ScanError::InvalidFrameLength {
                expected,
                actual: line.len(),
            });
        }
        self.rows.push(line);
        Ok(())
    }
    pub fn is_complete(&self) -> bool {
        self.rows.len() == self.depth
    }
    pub fn commit(self) -> Result<WaterfallMatrix, ScanError> {
        if !self.is_complete() {
            return Err(ScanError::IncompleteCapture {
                expected: self.depth,
                actual: self.rows.len(),
            });
        }
        let width = self.frame_size.unwrap_or(0);
        let rows = self.rows;
        let data = Array2::from_shape_fn((rows.len(), width), |(r, c)| rows[r][c]);
        Ok(WaterfallMatrix { data })
    }
}
#[cfg(test)]
pub(crate) fn filled_matrix(depth: usize, frame_size: usize, value: impl Fn(usize, usize) -> f64) -> WaterfallMatrix {
    let mut buffer = WaterfallBuffer::begin_capture(depth);
    for r in 0..depth {
        buffer
            .append((0..frame_size).map(|c| value(r, c)).collect())
            .unwrap();
    }
    buffer.commit().unwrap()
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn commit_before_depth_is_incomplete() {
        let mut buffer = WaterfallBuffer::begin_capture(3);
        buffer.append(vec![0.0; 4]).unwrap();
        buffer.append(vec![0.0; 4]).unwrap();
        assert!(!buffer.is_complete());
        match buffer.commit() {
            Err(ScanError::IncompleteCapture { expected, actual }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
    #[test]
    fn append_past_depth_is_full() {
        let mut buffer = WaterfallBuffer::begin_capture(2);
        buffer.append(vec![1.0; 4]).unwrap();
        buffer.append(vec![2.0; 4]).unwrap();
        assert!(buffer.is_complete());
        assert!(matches!(
            buffer.append(vec![3.0; 4]),
            Err(ScanError::BufferFull { depth: 2 })
        ));
        assert_eq!(buffer.commit().unwrap().depth(), 2);
    }
    #[test]
    fn rows_must_share_a_width() {
        let mut buffer = WaterfallBuffer::begin_capture(2);
        buffer.append(vec![1.0; 8]).unwrap();
        assert!(matches!(
            buffer.append(vec![1.0; 7]),
            Err(ScanError::InvalidFrameLength {
                expected: 8,
                actual: 7
            })
        ));
    }
    #[test]
    fn committed_matrix_keeps_row_order() {
        let matrix = filled_matrix(4, 3, |r, c| (r * 10 + c) as f64);
        assert_eq!(matrix.depth(), 4);
        assert_eq!(matrix.frame_size(), 3);
        assert_eq!(matrix.as_array().row(0).to_vec(), vec![0.0, 1.0, 2.0]);
        assert_eq!(matrix.latest().unwrap(), vec![30.0, 31.0, 32.0]);
        assert!((matrix.mean_power() - 16.0).abs() < 1e-12);
    }
}
