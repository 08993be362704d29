// src/batch.rs
// 无界面模式: 扫一遍所有信道, 结果写成 PNG
use std::path::Path;
use anyhow::{Context, Result};
use log::{info, warn};
use crate::scanner::plot::ensure_dir;
use crate::scanner::{present, CaptureDevice, PlotStyle, PngSink, ScanController, ScanReport};

pub fn run<D: CaptureDevice>(
    controller: &ScanController<D>,
    out_dir: &Path,
    style: PlotStyle,
) -> Result<ScanReport> {
    ensure_dir(out_dir)?;
    let session = controller.session();
    let report = controller
        .scan_all_with(|index, outcome| match outcome {
            Ok(()) => info!("channel {index} committed"),
            Err(err) => warn!("channel {index} failed: {err}"),
        })
        .context("sweep aborted")?;

    let mut sink = PngSink::new(out_dir, style);
    let mut views = Vec::with_capacity(session.table().size());
    for index in 0..session.table().size() {
        let view = session.view_of(index)?;
        present(&mut sink, &view)
            .with_context(|| format!("failed to render {}", view.label()))?;
        views.push(view);
    }
    let overview = sink.render_overview(&views)?;
    info!(
        "wrote {} images to {} (overview: {})",
        sink.written().len(),
        out_dir.display(),
        overview.display()
    );
    Ok(report)
}
