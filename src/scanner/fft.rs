use std::f64::consts::PI;
use std::sync::Arc;
use rustfft::{num_complex::Complex64, Fft, FftPlanner};
use crate::scanner::ScanError;
/// Added to every magnitude before the log so silent bins bottom out at -240 dB.
pub const POWER_FLOOR_EPSILON: f64 = 1e-12;
/// One captured frame as power in dB, most negative frequency offset first.
pub type SpectrumLine = Vec<f64>;
/// Turns raw frames into log-power spectrum lines: Hann window, FFT, shift, dB.
///
/// Holds only the precomputed window and FFT plan, so `process` is a pure
/// function of its input.
pub struct SpectralProcessor {
    frame_size: usize,
    window: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
}
impl SpectralProcessor {
    pub fn with_size(frame_size: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(frame_size);
        Self {
            frame_size,
            window: hann_window(frame_size),
            fft,
        }
    }
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }
    pub fn process(&self, frame: &[Complex64]) -> Result<SpectrumLine, ScanError> {
        if frame.len() != self.frame_size {
            return Err(ScanError::InvalidFrameLength {
                expected: self.frame_size,
                actual: frame.len(),
            });
        }
        let mut buffer: Vec<Complex64> = frame
            .iter()
            .zip(&self.window)
            .map(|(sample, w)| *sample * *w)
            .collect();
        self.fft.process(&mut buffer);
        // DC to the middle bin.
        buffer.rotate_right(self.frame_size / 2);
        Ok(buffer
            .iter()
            .map(|bin| 20.0 * (bin.norm() + POWER_FLOOR_EPSILON).log10())
            .collect())
    }
}
/// Symmetric Hann window, `0.5 - 0.5 cos(2 pi n / (N - 1))`.
pub fn hann_window(len: usize) -> Vec<f64> {
    match len {
        0 => return Vec::new(),
        1 => return vec![1.0],
        _ => {}
    }
    let denom = (len - 1) as f64;
    (0..len)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / denom).cos())
        .collect()
}
/// `frame_size` evenly spaced points spanning `center_hz +/- sample_rate_hz / 2`,
/// both ends included. Every renderer of a spectrum line uses this axis.
pub fn frequency_axis(center_hz: f64, sample_rate_hz: f64, frame_size: usize) -> Vec<f64> {
    let start = center_hz - sample_rate_hz / 2.0;
    match frame_size {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = sample_rate_hz / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn tone(frame_size: usize, bin_offset: i64) -> Vec<Complex64> {
        (0..frame_size)
            .map(|n| {
                let phase = 2.0 * PI * bin_offset as f64 * n as f64 / frame_size as f64;
                Complex64::from_polar(1.0, phase)
            })
            .collect()
    }
    fn peak_index(line: &[f64]) -> usize {
        line.iter()
            .enumerate()
            .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
            .0
    }
    #[test]
    fn silent_frame_hits_the_floor() {
        let processor = SpectralProcessor::with_size(256);
        let line = processor
            .process(&vec![Complex64::new(0.0, 0.0); 256])
            .unwrap();
        let floor = 20.0 * POWER_FLOOR_EPSILON.log10();
        assert!((floor + 240.0).abs() < 1e-9);
        assert!(line.iter().all(|&v| (v - floor).abs() < 1e-9));
    }
    #[test]
    fn output_length_tracks_frame_length() {
        for size in [1usize, 7, 64, 1000] {
            let processor = SpectralProcessor::with_size(size);
            let frame: Vec<Complex64> = (0..size)
                .map(|i| Complex64::new(i as f64, -(i as f64) * 0.5))
                .collect();
            assert_eq!(processor.process(&frame).unwrap().len(), size);
        }
    }
    #[test]
    fn wrong_frame_length_is_rejected() {
        let processor = SpectralProcessor::with_size(128);
        match processor.process(&vec![Complex64::new(1.0, 0.0); 64]) {
            Err(ScanError::InvalidFrameLength { expected, actual }) => {
                assert_eq!(expected, 128);
                assert_eq!(actual, 64);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
    #[test]
    fn dc_lands_in_middle_bin() {
        let processor = SpectralProcessor::with_size(64);
        let line = processor.process(&tone(64, 0)).unwrap();
        assert_eq!(peak_index(&line), 32);
    }
    #[test]
    fn negative_offsets_sit_left_of_centre() {
        let processor = SpectralProcessor::with_size(128);
        let above = processor.process(&tone(128, 10)).unwrap();
        let below = processor.process(&tone(128, -10)).unwrap();
        assert_eq!(peak_index(&above), 74);
        assert_eq!(peak_index(&below), 54);
    }
    #[test]
    fn processing_is_deterministic() {
        let processor = SpectralProcessor::with_size(32);
        let frame = tone(32, 3);
        assert_eq!(
            processor.process(&frame).unwrap(),
            processor.process(&frame).unwrap()
        );
    }
    #[test]
    fn degenerate_window_lengths() {
        assert!(hann_window(0).is_empty());
        assert_eq!(hann_window(1), vec![1.0]);
    }
    #[test]
    fn hann_window_is_symmetric_with_zero_ends() {
        let w = hann_window(9);
        assert!(w[0].abs() < 1e-12);
        assert!(w[8].abs() < 1e-12);
        assert!((w[4] - 1.0).abs() < 1e-12);
        for i in 0..9 {
            assert!((w[i] - w[8 - i]).abs() < 1e-12);
        }
    }
    #[test]
    fn frequency_axis_spans_sample_rate() {
        let axis = frequency_axis(2.412e9, 30e6, 1024);
        assert_eq!(axis.len(), 1024);
        assert!((axis[0] - 2.397e9).abs() < 1e-3);
        assert!((axis[1023] - 2.427e9).abs() < 1e-3);
        assert!(axis.windows(2).all(|w| w[1] > w[0]));
    }
}
