use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use log::{info, warn};
use crate::scanner::buffer::{WaterfallBuffer, WaterfallMatrix};
use crate::scanner::fft::SpectralProcessor;
use crate::scanner::session::{ChannelView, ScanSession};
use crate::scanner::source::{CaptureDevice, DeviceConfig};
use crate::scanner::ScanError;
/// Outcome of a full-table sweep.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanReport {
    pub committed: Vec<usize>,
    /// Failed channel index -> reason.
    pub failed: BTreeMap<usize, String>,
    /// Channels never attempted because the sweep was cancelled.
    pub skipped: Vec<usize>,
}
impl ScanReport {
    pub fn failed_indices(&self) -> BTreeSet<usize> {
        self.failed.keys().copied().collect()
    }
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}
/// Drives the capture device through single-channel and full-table scans.
///
/// The device sits behind its own mutex, so only one scan is ever in flight;
/// display reads go through the session and never wait on a scan.
pub struct ScanController<D: CaptureDevice> {
    session: Arc<ScanSession>,
    device: Mutex<D>,
    processor: SpectralProcessor,
    cancel: AtomicBool,
}
impl<D: CaptureDevice> ScanController<D> {
    /// Applies `device_config` to the device once; it stays fixed afterwards.
    pub fn new(
        session: Arc<ScanSession>,
        mut device: D,
        device_config: &DeviceConfig,
    ) -> Result<Self, ScanError> {
        if device_config.frame_size != session.frame_size() {
            return Err(ScanError::InvalidConfig(format!(
                "device frame size {} does not match session frame size {}",
                device_config.frame_size,
                session.frame_size()
            )));
        }
        if device_config.sample_rate_hz != session.sample_rate_hz() {
            return Err(ScanError::InvalidConfig(format!(
                "device sample rate {} does not match session sample rate {}",
                device_config.sample_rate_hz,
                session.sample_rate_hz()
            )));
        }
        device.configure(device_config)?;
        Ok(Self {
            processor: SpectralProcessor::with_size(session.frame_size()),
            session,
            device: Mutex::new(device),
            cancel: AtomicBool::new(false),
        })
    }
    pub fn session(&self) -> &Arc<ScanSession> {
        &self.session
    }
    /// Asks the running (or next) scan to stop before its next frame. The
    /// request is consumed when that scan ends.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }
    pub fn scan_channel(&self, index: usize) -> Result<(), ScanError> {
        self.session.table().at(index)?;
        let mut device = self.lock_device()?;
        let outcome = self.scan_locked(&mut device, index);
        self.cancel.store(false, Ordering::SeqCst);
        outcome
    }
    pub fn scan_all(&self) -> Result<ScanReport, ScanError> {
        self.scan_all_with(|_, _| {})
    }
    /// Sweeps the table in order, calling `on_channel` after every channel.
    ///
    /// Capture failures are collected and the sweep moves on; any other error
    /// ends the sweep and is returned.
    pub fn scan_all_with(
        &self,
        mut on_channel: impl FnMut(usize, &Result<(), ScanError>),
    ) -> Result<ScanReport, ScanError> {
        let mut device = self.lock_device()?;
        let report = self.sweep(&mut device, &mut on_channel);
        self.cancel.store(false, Ordering::SeqCst);
        let report = report?;
        info!(
            "sweep finished: {} committed, {} failed, {} skipped",
            report.committed.len(),
            report.failed.len(),
            report.skipped.len()
        );
        Ok(report)
    }
    pub fn next(&self) -> usize {
        self.session.cursor().next()
    }
    pub fn previous(&self) -> usize {
        self.session.cursor().previous()
    }
    pub fn jump(&self, index: usize) -> Result<usize, ScanError> {
        self.session.cursor().jump(index)
    }
    pub fn current_view(&self) -> ChannelView {
        self.session.current_view()
    }
    fn sweep(
        &self,
        device: &mut D,
        on_channel: &mut impl FnMut(usize, &Result<(), ScanError>),
    ) -> Result<ScanReport, ScanError> {
        let count = self.session.table().size();
        let mut report = ScanReport::default();
        for index in 0..count {
            let outcome = self.scan_locked(device, index);
            on_channel(index, &outcome);
            match outcome {
                Ok(()) => report.committed.push(index),
                Err(err @ ScanError::Cancelled { .. }) => {
                    report.failed.insert(index, err.to_string());
                    report.skipped.extend(index + 1..count);
                    break;
                }
                Err(ScanError::CaptureFailure(reason)) => {
                    report.failed.insert(index, reason);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(report)
    }
    fn lock_device(&self) -> Result<MutexGuard<'_, D>, ScanError> {
        match self.device.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => Err(ScanError::ScanInProgress),
        }
    }
    fn scan_locked(&self, device: &mut D, index: usize) -> Result<(), ScanError> {
        let channel = self.session.table().at(index)?;
        info!(
            "scanning {} @ {:.3} GHz",
            channel.label(),
            channel.center_hz / 1e9
        );
        let store = self.session.store();
        match self.capture_waterfall(device, index, channel.center_hz) {
            Ok(matrix) => store.update(index, matrix),
            Err(err) => {
                warn!("scan of {} failed: {err}", channel.label());
                store.mark_failed(index)?;
                Err(err)
            }
        }
    }
    fn capture_waterfall(
        &self,
        device: &mut D,
        index: usize,
        center_hz: f64,
    ) -> Result<WaterfallMatrix, ScanError> {
        device.tune(center_hz).map_err(device_error)?;
        let mut buffer = WaterfallBuffer::begin_capture(self.session.waterfall_depth());
        while !buffer.is_complete() {
            if self.cancel.load(Ordering::SeqCst) {
                return Err(ScanError::Cancelled { index });
            }
            let frame = device.capture_frame().map_err(device_error)?;
            buffer.append(self.processor.process(&frame)?)?;
        }
        buffer.commit()
    }
}
/// Anything the device raises counts as a capture failure.
fn device_error(err: ScanError) -> ScanError {
    match err {
        ScanError::CaptureFailure(_) => err,
        other => ScanError::CaptureFailure(other.to_string()),
    }
}
