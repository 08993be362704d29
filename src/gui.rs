// src/gui.rs
use eframe::egui;
use egui::{Color32, ColorImage, TextureHandle, TextureOptions};
use egui_plot::{Bar, BarChart, Line, Plot, PlotImage, PlotPoint, PlotPoints};
use log::{info, warn};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use crate::engine;
use crate::scanner::sink::{bar_range, clip_levels, heat_color, normalize};
use crate::scanner::{
    present, CaptureDevice, DisplaySink, ScanController, ScanError, ScanSession, WaterfallMatrix,
};
use crate::types::{FrontEnd, ScanCommand, ScanEvent};

const LOG_LINES: usize = 8;

// 瀑布图: 第 0 行 (最早) 画在最下面
struct WaterfallImage {
    image: ColorImage,
    x_range_mhz: (f64, f64),
    depth: usize,
}

/// egui 侧的绘图缓存, 由 `present` 填充, 每帧只负责画.
#[derive(Default)]
pub struct PlotState {
    title: String,
    failed: bool,
    bars: Vec<(u32, f64)>,
    bar_range: Option<(f64, f64)>,
    waterfall: Option<WaterfallImage>,
    texture: Option<TextureHandle>,
    texture_dirty: bool,
    spectrum: Vec<[f64; 2]>,
    placeholder: Option<String>,
}

impl DisplaySink for PlotState {
    fn render_aggregate_bar(
        &mut self,
        channel_ids: &[u32],
        values: &[f64],
        scanned: &[bool],
    ) -> Result<(), ScanError> {
        self.bars = channel_ids
            .iter()
            .zip(values)
            .zip(scanned)
            .filter(|(_, scanned)| **scanned)
            .map(|((&id, &v), _)| (id, v))
            .collect();
        self.bar_range = bar_range(values, scanned);
        Ok(())
    }

    fn render_waterfall(
        &mut self,
        matrix: &WaterfallMatrix,
        frequency_axis: &[f64],
        label: &str,
    ) -> Result<(), ScanError> {
        let levels = clip_levels(matrix);
        let (depth, width) = (matrix.depth(), matrix.frame_size());
        let data = matrix.as_array();
        let mut rgb = Vec::with_capacity(depth * width * 3);
        for y in 0..depth {
            let row = depth - 1 - y;
            for x in 0..width {
                rgb.extend_from_slice(&heat_color(normalize(data[[row, x]], levels)));
            }
        }
        let first = frequency_axis.first().copied().unwrap_or(0.0);
        let last = frequency_axis.last().copied().unwrap_or(first);
        self.waterfall = Some(WaterfallImage {
            image: ColorImage::from_rgb([width, depth], &rgb),
            x_range_mhz: (first / 1e6, last / 1e6),
            depth,
        });
        self.texture_dirty = true;
        self.placeholder = None;
        self.title = label.to_owned();
        Ok(())
    }

    fn render_spectrum_line(
        &mut self,
        line: &[f64],
        frequency_axis: &[f64],
        _label: &str,
    ) -> Result<(), ScanError> {
        self.spectrum = frequency_axis
            .iter()
            .zip(line)
            .map(|(&f, &db)| [f / 1e6, db])
            .collect();
        Ok(())
    }

    fn render_placeholder(&mut self, label: &str) -> Result<(), ScanError> {
        self.waterfall = None;
        self.texture = None;
        self.spectrum.clear();
        self.placeholder = Some(format!("{label}: no data, press Scan"));
        self.title = label.to_owned();
        Ok(())
    }

    fn render_scan_status(&mut self, label: &str, failed: bool) -> Result<(), ScanError> {
        self.title = label.to_owned();
        self.failed = failed;
        Ok(())
    }
}

impl PlotState {
    fn texture(&mut self, ctx: &egui::Context) -> Option<&TextureHandle> {
        if self.texture_dirty {
            if let Some(wf) = &self.waterfall {
                self.texture = Some(ctx.load_texture("waterfall", wf.image.clone(), TextureOptions::NEAREST));
            }
            self.texture_dirty = false;
        }
        self.texture.as_ref()
    }
}

pub struct ChanScopeApp<D: CaptureDevice + Send + 'static> {
    mode: FrontEnd,
    controller: Arc<ScanController<D>>,
    session: Arc<ScanSession>,
    plots: PlotState,
    busy: bool,
    log_messages: Vec<String>,
    // 通讯管道
    rx: Receiver<ScanEvent>,
    tx_cmd: Sender<ScanCommand>,
    worker: Option<JoinHandle<()>>,
}

impl<D: CaptureDevice + Send + 'static> ChanScopeApp<D> {
    pub fn new(mode: FrontEnd, controller: Arc<ScanController<D>>) -> Self {
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();
        // 启动后台扫描线程
        let worker = engine::spawn_thread(controller.clone(), tx, rx_cmd);
        let session = controller.session().clone();
        let mut app = Self {
            mode,
            controller,
            session,
            plots: PlotState::default(),
            busy: false,
            log_messages: vec!["chanscope ready.".to_owned()],
            rx,
            tx_cmd,
            worker: Some(worker),
        };
        if mode == FrontEnd::Advance {
            // 推进模式: 先扫第一个信道
            let first = app.session.cursor().get();
            app.send(ScanCommand::ScanChannel(first));
        }
        app.refresh();
        app
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > LOG_LINES {
            self.log_messages.remove(0);
        }
    }

    fn send(&mut self, cmd: ScanCommand) {
        if self.tx_cmd.send(cmd).is_err() {
            self.log("Scan engine is gone.");
        } else {
            self.busy = true;
        }
    }

    fn refresh(&mut self) {
        let view = self.controller.current_view();
        if let Err(err) = present(&mut self.plots, &view) {
            warn!("redraw failed: {err}");
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                ScanEvent::Log(msg) => self.log(&msg),
                ScanEvent::Busy(busy) => self.busy = busy,
                ScanEvent::ChannelDone { index, ok } => {
                    if !ok {
                        let label = self
                            .session
                            .table()
                            .at(index)
                            .map(|c| c.label())
                            .unwrap_or_else(|_| index.to_string());
                        self.log(&format!("{label}: scan failed"));
                    }
                    self.refresh();
                }
                ScanEvent::SweepDone(report) => {
                    if !report.is_clean() {
                        self.log(&format!(
                            "{} channel(s) failed, {} skipped",
                            report.failed.len(),
                            report.skipped.len()
                        ));
                    }
                    self.refresh();
                }
                ScanEvent::Fatal(msg) => {
                    self.log(&format!("Scan aborted: {msg}"));
                    self.refresh();
                }
            }
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| match self.mode {
            FrontEnd::Advance => {
                if ui.add_enabled(!self.busy, egui::Button::new("Next Channel")).clicked() {
                    let index = self.controller.next();
                    self.refresh();
                    self.send(ScanCommand::ScanChannel(index));
                }
            }
            _ => {
                if ui.add_enabled(!self.busy, egui::Button::new("Scan")).clicked() {
                    self.send(ScanCommand::ScanAll);
                }
                // 翻页只读 store, 扫描进行中也可以
                if ui.button("Channel ↓").clicked() {
                    self.controller.previous();
                    self.refresh();
                }
                if ui.button("Channel ↑").clicked() {
                    self.controller.next();
                    self.refresh();
                }
                if self.busy && ui.button("Cancel").clicked() {
                    self.controller.cancel();
                }
            }
        });
    }

    fn draw_status(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(&self.plots.title);
            if let Ok(channel) = self.session.table().at(self.session.cursor().get()) {
                ui.label(format!("{:.3} GHz", channel.center_hz / 1e9));
            }
            if self.plots.failed {
                ui.colored_label(Color32::from_rgb(220, 80, 80), "last scan failed");
            }
            if self.busy {
                ui.spinner();
            }
        });
    }

    fn draw_bars(&self, ui: &mut egui::Ui, height: f32) {
        let (lo, hi) = self.plots.bar_range.unwrap_or((-100.0, 0.0));
        let bars: Vec<Bar> = self
            .plots
            .bars
            .iter()
            .map(|&(id, v)| Bar::new(id as f64, v - lo).base_offset(lo).width(0.8).name(format!("CH{id}")))
            .collect();
        Plot::new("aggregate_bar")
            .height(height)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .include_y(lo)
            .include_y(hi)
            .x_axis_label("Channel")
            .y_axis_label("Mean power (dB)")
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(Color32::from_rgb(59, 82, 139)));
            });
    }

    fn draw_channel(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        if let Some(text) = &self.plots.placeholder {
            ui.centered_and_justified(|ui| ui.label(text.as_str()));
            return;
        }
        let height = ui.available_height();
        let spectrum_width = ui.available_width() * 0.25;
        let waterfall_width = ui.available_width() - spectrum_width - 8.0;
        let placement = self
            .plots
            .waterfall
            .as_ref()
            .map(|wf| (wf.x_range_mhz, wf.depth));
        let texture = self.plots.texture(ctx).map(|t| t.id());
        let spectrum = self.plots.spectrum.clone();
        ui.horizontal(|ui| {
            Plot::new("waterfall")
                .width(waterfall_width)
                .height(height)
                .x_axis_label("Frequency (MHz)")
                .y_axis_label("Frame")
                .show(ui, |plot_ui| {
                    if let (Some(id), Some(((f0, f1), depth))) = (texture, placement) {
                        let center = PlotPoint::new((f0 + f1) / 2.0, depth as f64 / 2.0);
                        let size = [(f1 - f0) as f32, depth as f32];
                        plot_ui.image(PlotImage::new(id, center, size));
                    }
                });
            Plot::new("spectrum")
                .width(spectrum_width)
                .height(height)
                .x_axis_label("Frequency (MHz)")
                .y_axis_label("dB")
                .show(ui, |plot_ui| {
                    plot_ui.line(Line::new(PlotPoints::new(spectrum)).color(Color32::from_rgb(94, 201, 98)));
                });
        });
    }
}

impl<D: CaptureDevice + Send + 'static> eframe::App for ChanScopeApp<D> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        if self.busy {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            self.controls(ui);
            ui.separator();
            egui::ScrollArea::vertical().max_height(100.0).show(ui, |ui| {
                for m in &self.log_messages {
                    ui.monospace(m);
                }
            });
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_status(ui);
            let bar_height = ui.available_height() / 3.0;
            self.draw_bars(ui, bar_height);
            ui.separator();
            self.draw_channel(ui, ctx);
        });
    }
}

impl<D: CaptureDevice + Send + 'static> Drop for ChanScopeApp<D> {
    fn drop(&mut self) {
        self.controller.cancel();
        self.tx_cmd.send(ScanCommand::Shutdown).ok();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("scan engine panicked");
            }
        }
        info!("gui closed");
    }
}

pub fn run<D>(mode: FrontEnd, controller: Arc<ScanController<D>>) -> eframe::Result<()>
where
    D: CaptureDevice + Send + 'static,
{
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1400.0, 860.0])
        .with_min_inner_size([900.0, 600.0])
        .with_title("chanscope");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "chanscope",
        options,
        Box::new(move |_cc| Box::new(ChanScopeApp::new(mode, controller))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::buffer::filled_matrix;
    use crate::scanner::{ChannelTable, ScanSession};

    #[test]
    fn placeholder_clears_previous_plots() {
        let session = ScanSession::new(ChannelTable::wifi_24ghz(), 30e6, 8, 4).unwrap();
        session.store().update(0, filled_matrix(4, 8, |r, c| (r * 8 + c) as f64)).unwrap();
        let mut plots = PlotState::default();
        present(&mut plots, &session.current_view()).unwrap();
        assert!(plots.waterfall.is_some());
        assert_eq!(plots.spectrum.len(), 8);
        assert_eq!(plots.bars, vec![(1, session.store().get(0).aggregate_power)]);

        session.cursor().next();
        present(&mut plots, &session.current_view()).unwrap();
        assert!(plots.waterfall.is_none());
        assert!(plots.spectrum.is_empty());
        assert_eq!(plots.title, "CH2");
        assert!(plots.placeholder.is_some());
    }

    #[test]
    fn waterfall_image_puts_oldest_row_at_bottom() {
        let matrix = filled_matrix(3, 5, |r, _| r as f64 * 10.0);
        let axis = crate::scanner::frequency_axis(2.412e9, 30e6, 5);
        let mut plots = PlotState::default();
        plots.render_waterfall(&matrix, &axis, "CH1").unwrap();
        let wf = plots.waterfall.as_ref().unwrap();
        assert_eq!(wf.image.size, [5, 3]);
        let top = wf.image.pixels[0];
        let bottom = wf.image.pixels[2 * 5];
        // newest row is the brightest
        assert!(top.g() > bottom.g());
        assert!((wf.x_range_mhz.0 - 2397.0).abs() < 1e-9);
        assert!((wf.x_range_mhz.1 - 2427.0).abs() < 1e-9);
    }
}
