use std::f64::consts::PI;
use std::thread;
use std::time::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustfft::num_complex::Complex64;
use serde::{Deserialize, Serialize};
use crate::scanner::ScanError;
/// One block of complex baseband samples captured at a fixed tuning.
pub type SampleFrame = Vec<Complex64>;
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GainMode {
    Manual,
    SlowAttack,
    FastAttack,
}
/// Receiver settings applied once at startup and fixed for the process lifetime.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceConfig {
    pub sample_rate_hz: f64,
    pub rx_bandwidth_hz: f64,
    pub frame_size: usize,
    pub gain_mode: GainMode,
    pub gain_db: f64,
    /// Pause after every retune before samples are trusted.
    pub settle: Duration,
}
/// The radio front end as seen by the scanner.
///
/// `tune` owns the settling delay: when it returns, the next `capture_frame`
/// yields samples from the new centre frequency. Both calls block.
pub trait CaptureDevice {
    fn configure(&mut self, config: &DeviceConfig) -> Result<(), ScanError>;
    fn tune(&mut self, center_hz: f64) -> Result<(), ScanError>;
    fn capture_frame(&mut self) -> Result<SampleFrame, ScanError>;
}
impl<D: CaptureDevice + ?Sized> CaptureDevice for Box<D> {
    fn configure(&mut self, config: &DeviceConfig) -> Result<(), ScanError> {
        (**self).configure(config)
    }
    fn tune(&mut self, center_hz: f64) -> Result<(), ScanError> {
        (**self).tune(center_hz)
    }
    fn capture_frame(&mut self) -> Result<SampleFrame, ScanError> {
        (**self).capture_frame()
    }
}
/// Simulated receiver: a complex tone at a fixed offset from the tuned centre,
/// plus optional seeded noise. Deterministic for a given seed.
pub struct ToneSource {
    config: Option<DeviceConfig>,
    tuned_hz: Option<f64>,
    tone_offset_hz: f64,
    tone_amplitude: f64,
    noise_amplitude: f64,
    rng: StdRng,
    sample_index: u64,
    failing_hz: Vec<f64>,
}
impl ToneSource {
    pub fn new(tone_offset_hz: f64, tone_amplitude: f64, noise_amplitude: f64, seed: u64) -> Self {
        Self {
            config: None,
            tuned_hz: None,
            tone_offset_hz,
            tone_amplitude,
            noise_amplitude,
            rng: StdRng::seed_from_u64(seed),
            sample_index: 0,
            failing_hz: Vec::new(),
        }
    }
    /// Retuning to any of these centre frequencies fails with `CaptureFailure`.
    pub fn with_failures(mut self, failing_hz: impl IntoIterator<Item = f64>) -> Self {
        self.failing_hz = failing_hz.into_iter().collect();
        self
    }
    fn active_config(&self) -> Result<&DeviceConfig, ScanError> {
        self.config
            .as_ref()
            .ok_or_else(|| ScanError::CaptureFailure("device not configured".into()))
    }
}
impl CaptureDevice for ToneSource {
    fn configure(&mut self, config: &DeviceConfig) -> Result<(), ScanError> {
        if config.sample_rate_hz <= 0.0 {
            return Err(ScanError::InvalidConfig(
                "sample rate must be greater than zero".into(),
            ));
        }
        if config.frame_size == 0 {
            return Err(ScanError::InvalidConfig(
                "frame size must be greater than zero".into(),
            ));
        }
        self.config = Some(config.clone());
        Ok(())
    }
    fn tune(&mut self, center_hz: f64) -> Result<(), ScanError> {
        let settle = self.active_config()?.settle;
        if self.failing_hz.iter().any(|f| (f - center_hz).abs() < 1.0) {
            self.tuned_hz = None;
            return Err(ScanError::CaptureFailure(format!(
                "failed to lock LO at {:.3} MHz",
                center_hz / 1e6
            )));
        }
        self.tuned_hz = Some(center_hz);
        if !settle.is_zero() {
            thread::sleep(settle);
        }
        Ok(())
    }
    fn capture_frame(&mut self) -> Result<SampleFrame, ScanError> {
        let config = self.active_config()?;
        if self.tuned_hz.is_none() {
            return Err(ScanError::CaptureFailure("receiver not tuned".into()));
        }
        let frame_size = config.frame_size;
        let step = 2.0 * PI * self.tone_offset_hz / config.sample_rate_hz;
        let mut frame = Vec::with_capacity(frame_size);
        for _ in 0..frame_size {
            let phase = step * self.sample_index as f64;
            let mut sample = Complex64::from_polar(self.tone_amplitude, phase);
            if self.noise_amplitude > 0.0 {
                let a = self.noise_amplitude;
                sample += Complex64::new(self.rng.gen_range(-a..a), self.rng.gen_range(-a..a));
            }
            frame.push(sample);
            self.sample_index += 1;
        }
        Ok(frame)
    }
}
