// src/engine.rs
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use log::{error, info};
use crate::scanner::{CaptureDevice, ScanController, ScanError, ScanReport};
use crate::types::{ScanCommand, ScanEvent};

/// 后台扫描线程: 设备 I/O 全部在这里, UI 线程只读 session.
pub fn spawn_thread<D>(
    controller: Arc<ScanController<D>>,
    tx: Sender<ScanEvent>,
    rx_cmd: Receiver<ScanCommand>,
) -> JoinHandle<()>
where
    D: CaptureDevice + Send + 'static,
{
    thread::spawn(move || {
        tx.send(ScanEvent::Log("Scan engine ready.".to_owned())).ok();
        for cmd in rx_cmd {
            match cmd {
                ScanCommand::ScanAll => {
                    tx.send(ScanEvent::Busy(true)).ok();
                    tx.send(ScanEvent::Log("Scanning all channels...".to_owned())).ok();
                    let result = controller.scan_all_with(|index, outcome| {
                        tx.send(ScanEvent::ChannelDone {
                            index,
                            ok: outcome.is_ok(),
                        })
                        .ok();
                    });
                    match result {
                        Ok(report) => {
                            tx.send(ScanEvent::Log(summary(&report))).ok();
                            tx.send(ScanEvent::SweepDone(report)).ok();
                        }
                        Err(err) => report_error(&tx, err),
                    }
                    tx.send(ScanEvent::Busy(false)).ok();
                }
                ScanCommand::ScanChannel(index) => {
                    tx.send(ScanEvent::Busy(true)).ok();
                    let outcome = controller.scan_channel(index);
                    match outcome {
                        Ok(()) => {
                            tx.send(ScanEvent::ChannelDone { index, ok: true }).ok();
                        }
                        Err(err) if err.is_recoverable() => {
                            tx.send(ScanEvent::Log(format!("Scan failed: {err}"))).ok();
                            tx.send(ScanEvent::ChannelDone { index, ok: false }).ok();
                        }
                        Err(err) => report_error(&tx, err),
                    }
                    tx.send(ScanEvent::Busy(false)).ok();
                }
                ScanCommand::Shutdown => {
                    info!("scan engine shutting down");
                    break;
                }
            }
        }
    })
}

fn report_error(tx: &Sender<ScanEvent>, err: ScanError) {
    match err {
        // 按钮连点: 前一次扫描还没结束
        ScanError::ScanInProgress => {
            tx.send(ScanEvent::Log("Scan already running.".to_owned())).ok();
        }
        other => {
            error!("scan aborted: {other}");
            tx.send(ScanEvent::Fatal(other.to_string())).ok();
        }
    }
}

fn summary(report: &ScanReport) -> String {
    if report.is_clean() {
        return format!("Sweep done: {} channels.", report.committed.len());
    }
    let failed: Vec<String> = report.failed_indices().iter().map(|i| i.to_string()).collect();
    format!(
        "Sweep done: {} ok, failed [{}], {} skipped.",
        report.committed.len(),
        failed.join(", "),
        report.skipped.len()
    )
}
