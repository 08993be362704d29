// src/config.rs
use std::path::Path;
use std::time::Duration;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use crate::scanner::{Channel, ChannelTable, DeviceConfig, GainMode, ScanError, ScanSession, ToneSource};
/// Stand-in receiver settings used when no radio is attached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Tone position relative to the tuned centre.
    pub tone_offset_hz: f64,
    pub tone_amplitude: f64,
    pub noise_amplitude: f64,
    pub seed: u64,
    /// Channel ids whose retune always fails.
    pub fail_channel_ids: Vec<u32>,
}
impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tone_offset_hz: 2.0e6,
            tone_amplitude: 1.0,
            noise_amplitude: 0.05,
            seed: 7,
            fail_channel_ids: Vec::new(),
        }
    }
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Receiver URI, e.g. `ip:192.168.1.10`. Only reported; the radio driver lives outside.
    pub uri: String,
    pub sample_rate_hz: f64,
    pub rx_bandwidth_hz: f64,
    pub frame_size: usize,
    pub waterfall_depth: usize,
    pub gain_mode: GainMode,
    pub gain_db: f64,
    pub settle_ms: u64,
    pub channels: Vec<Channel>,
    pub simulation: SimulationConfig,
}
impl Default for ScanConfig {
    fn default() -> Self {
        // 30 MSPS / 20 MHz RF bandwidth, manual gain so AGC doesn't flatten bursts.
        Self {
            uri: "ip:192.168.1.10".to_owned(),
            sample_rate_hz: 30e6,
            rx_bandwidth_hz: 20e6,
            frame_size: 1024,
            waterfall_depth: 120,
            gain_mode: GainMode::Manual,
            gain_db: 55.0,
            settle_ms: 100,
            channels: ChannelTable::wifi_24ghz().iter().copied().collect(),
            simulation: SimulationConfig::default(),
        }
    }
}
impl ScanConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: ScanConfig = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.sample_rate_hz <= 0.0 {
            return Err(ScanError::InvalidConfig(
                "sample_rate_hz must be greater than zero".into(),
            ));
        }
        if self.frame_size == 0 {
            return Err(ScanError::InvalidConfig("frame_size must be greater than zero".into()));
        }
        if self.waterfall_depth == 0 {
            return Err(ScanError::InvalidConfig(
                "waterfall_depth must be greater than zero".into(),
            ));
        }
        if self.channels.is_empty() {
            return Err(ScanError::InvalidConfig("channel list is empty".into()));
        }
        Ok(())
    }
    pub fn device_config(&self) -> DeviceConfig {
        DeviceConfig {
            sample_rate_hz: self.sample_rate_hz,
            rx_bandwidth_hz: self.rx_bandwidth_hz,
            frame_size: self.frame_size,
            gain_mode: self.gain_mode,
            gain_db: self.gain_db,
            settle: Duration::from_millis(self.settle_ms),
        }
    }
    pub fn build_session(&self) -> Result<ScanSession, ScanError> {
        self.validate()?;
        let table = ChannelTable::new(self.channels.clone())?;
        ScanSession::new(
            table,
            self.sample_rate_hz,
            self.frame_size,
            self.waterfall_depth,
        )
    }
    pub fn simulated_device(&self) -> ToneSource {
        let sim = &self.simulation;
        let failing = self
            .channels
            .iter()
            .filter(|c| sim.fail_channel_ids.contains(&c.id))
            .map(|c| c.center_hz);
        ToneSource::new(
            sim.tone_offset_hz,
            sim.tone_amplitude,
            sim.noise_amplitude,
            sim.seed,
        )
        .with_failures(failing)
    }
}
