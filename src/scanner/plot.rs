use std::io::Cursor;
use std::path::{Path, PathBuf};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::coord::Shift;
use plotters::prelude::*;
use crate::scanner::buffer::WaterfallMatrix;
use crate::scanner::session::{ChannelView, ViewData};
use crate::scanner::sink::{bar_range, clip_levels, heat_color, normalize, DisplaySink};
use crate::scanner::ScanError;
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub foreground: RGBColor,
    /// Captions and axis labels. Needs a system font.
    pub labels: bool,
    /// Columns in the all-channel overview.
    pub grid_columns: usize,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 500,
            background: RGBColor(10, 10, 10),
            foreground: RGBColor(0, 200, 255),
            labels: true,
            grid_columns: 4,
        }
    }
}
/// Writes each render as a PNG file into `out_dir`.
pub struct PngSink {
    out_dir: PathBuf,
    style: PlotStyle,
    written: Vec<PathBuf>,
    failed_label: Option<String>,
}
impl PngSink {
    pub fn new(out_dir: impl Into<PathBuf>, style: PlotStyle) -> Self {
        Self {
            out_dir: out_dir.into(),
            style,
            written: Vec::new(),
            failed_label: None,
        }
    }
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
    /// One image with every channel's waterfall, `grid_columns` per row.
    pub fn render_overview(&mut self, views: &[ChannelView]) -> Result<PathBuf, ScanError> {
        let png = render_grid_png(views, &self.style)?;
        self.write("overview.png", &png)
    }
    fn write(&mut self, name: &str, png: &[u8]) -> Result<PathBuf, ScanError> {
        let path = self.out_dir.join(name);
        std::fs::write(&path, png)
            .map_err(|e| ScanError::Plot(format!("failed to write {}: {e}", path.display())))?;
        self.written.push(path.clone());
        Ok(path)
    }
    fn caption(&self, prefix: &str, label: &str) -> String {
        match &self.failed_label {
            Some(failed) if failed == label => format!("{prefix} {label} (last scan failed)"),
            _ => format!("{prefix} {label}"),
        }
    }
}
impl DisplaySink for PngSink {
    fn render_aggregate_bar(
        &mut self,
        channel_ids: &[u32],
        values: &[f64],
        scanned: &[bool],
    ) -> Result<(), ScanError> {
        let png = render_bar_png(channel_ids, values, scanned, &self.style)?;
        self.write("aggregate.png", &png)?;
        Ok(())
    }
    fn render_waterfall(
        &mut self,
        matrix: &WaterfallMatrix,
        frequency_axis: &[f64],
        label: &str,
    ) -> Result<(), ScanError> {
        let caption = self.caption("Waterfall", label);
        let png = render_waterfall_png(matrix, frequency_axis, &caption, &self.style)?;
        self.write(&file_name("waterfall", label), &png)?;
        Ok(())
    }
    fn render_spectrum_line(
        &mut self,
        line: &[f64],
        frequency_axis: &[f64],
        label: &str,
    ) -> Result<(), ScanError> {
        let caption = self.caption("Instantaneous Spectrum", label);
        let png = render_spectrum_png(line, frequency_axis, &caption, &self.style)?;
        self.write(&file_name("spectrum", label), &png)?;
        Ok(())
    }
    fn render_placeholder(&mut self, label: &str) -> Result<(), ScanError> {
        let caption = self.caption("No data", label);
        let png = render_placeholder_png(&caption, &self.style)?;
        self.write(&file_name("waterfall", label), &png)?;
        Ok(())
    }
    fn render_scan_status(&mut self, label: &str, failed: bool) -> Result<(), ScanError> {
        self.failed_label = failed.then(|| label.to_string());
        Ok(())
    }
}
fn file_name(kind: &str, label: &str) -> String {
    let slug: String = label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    format!("{kind}_{slug}.png")
}
fn to_mhz(frequency_axis: &[f64]) -> Vec<f64> {
    frequency_axis.iter().map(|f| f / 1e6).collect()
}
pub fn render_bar_png(
    channel_ids: &[u32],
    values: &[f64],
    scanned: &[bool],
    style: &PlotStyle,
) -> Result<Vec<u8>, ScanError> {
    if channel_ids.is_empty() {
        return Err(ScanError::Plot("no channels to plot".into()));
    }
    let (y_min, y_max) = bar_range(values, scanned).unwrap_or((-100.0, 0.0));
    let x_min = channel_ids.iter().copied().min().unwrap_or(0) as f64 - 1.0;
    let x_max = channel_ids.iter().copied().max().unwrap_or(0) as f64 + 1.0;
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if style.labels {
            builder
                .caption(
                    "Channel Energy Overview",
                    ("sans-serif", 20).into_font().color(&WHITE),
                )
                .set_label_area_size(LabelAreaPosition::Left, 50)
                .set_label_area_size(LabelAreaPosition::Bottom, 40);
        }
        let mut chart = builder.build_cartesian_2d(x_min..x_max, y_min..y_max)?;
        if style.labels {
            chart
                .configure_mesh()
                .x_desc("Channel")
                .y_desc("Avg Power (dB)")
                .disable_x_mesh()
                .light_line_style(&WHITE.mix(0.1))
                .label_style(("sans-serif", 12).into_font().color(&WHITE))
                .axis_desc_style(("sans-serif", 14).into_font().color(&WHITE))
                .draw()?;
        }
        let bars = channel_ids
            .iter()
            .zip(values)
            .zip(scanned)
            .filter(|(_, scanned)| **scanned)
            .map(|((&id, &value), _)| {
                let x = id as f64;
                Rectangle::new([(x - 0.4, y_min), (x + 0.4, value)], style.foreground.filled())
            });
        chart.draw_series(bars)?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
pub fn render_waterfall_png(
    matrix: &WaterfallMatrix,
    frequency_axis: &[f64],
    caption: &str,
    style: &PlotStyle,
) -> Result<Vec<u8>, ScanError> {
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        draw_waterfall(&root, matrix, frequency_axis, caption, style, 20)?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
pub fn render_spectrum_png(
    line: &[f64],
    frequency_axis: &[f64],
    caption: &str,
    style: &PlotStyle,
) -> Result<Vec<u8>, ScanError> {
    if line.is_empty() || line.len() != frequency_axis.len() {
        return Err(ScanError::Plot(format!(
            "spectrum line has {} points for a {}-point axis",
            line.len(),
            frequency_axis.len()
        )));
    }
    let mhz = to_mhz(frequency_axis);
    let (lo, hi) = line
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut builder = ChartBuilder::on(&root);
        builder.margin(10);
        if style.labels {
            builder
                .caption(caption, ("sans-serif", 20).into_font().color(&WHITE))
                .set_label_area_size(LabelAreaPosition::Left, 50)
                .set_label_area_size(LabelAreaPosition::Bottom, 40);
        }
        let x_range = mhz[0]..mhz[mhz.len() - 1].max(mhz[0] + 1e-6);
        let mut chart = builder.build_cartesian_2d(x_range, (lo - 5.0)..(hi + 5.0))?;
        if style.labels {
            chart
                .configure_mesh()
                .x_desc("Frequency (MHz)")
                .y_desc("Power (dB)")
                .light_line_style(&WHITE.mix(0.1))
                .label_style(("sans-serif", 12).into_font().color(&WHITE))
                .axis_desc_style(("sans-serif", 14).into_font().color(&WHITE))
                .draw()?;
        }
        let series = mhz.iter().copied().zip(line.iter().copied());
        chart.draw_series(LineSeries::new(series, &style.foreground))?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
pub fn render_placeholder_png(caption: &str, style: &PlotStyle) -> Result<Vec<u8>, ScanError> {
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        draw_placeholder(&root, caption, style)?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// Overview of every channel: waterfalls where scanned, placeholders elsewhere.
pub fn render_grid_png(views: &[ChannelView], style: &PlotStyle) -> Result<Vec<u8>, ScanError> {
    if views.is_empty() {
        return Err(ScanError::Plot("no channels to plot".into()));
    }
    let columns = style.grid_columns.max(1);
    let rows = views.len().div_ceil(columns);
    let cell_width = (style.width / columns as u32).max(1);
    let cell_style = PlotStyle {
        width: cell_width,
        ..style.clone()
    };
    let height = style.height.max(1) * rows as u32 / 2;
    let height = height.max(rows as u32);
    let mut buffer = vec![0u8; (style.width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, height)).into_drawing_area();
        root.fill(&style.background)?;
        let cells = root.split_evenly((rows, columns));
        for (view, cell) in views.iter().zip(cells.iter()) {
            let label = view.label();
            match &view.data {
                ViewData::Waterfall {
                    matrix,
                    frequency_axis,
                } => draw_waterfall(cell, matrix, frequency_axis, &label, &cell_style, 14)?,
                ViewData::NoData => draw_placeholder(cell, &format!("{label}: no data"), &cell_style)?,
            }
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, height)
}
fn draw_waterfall<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    matrix: &WaterfallMatrix,
    frequency_axis: &[f64],
    caption: &str,
    style: &PlotStyle,
    caption_size: u32,
) -> Result<(), ScanError>
where
    DB::ErrorType: 'static,
{
    let depth = matrix.depth();
    let bins = matrix.frame_size();
    if depth == 0 || bins == 0 || frequency_axis.len() != bins {
        return Err(ScanError::Plot(format!(
            "waterfall {depth}x{bins} does not fit a {}-point axis",
            frequency_axis.len()
        )));
    }
    let mhz = to_mhz(frequency_axis);
    let bin_width = if bins > 1 {
        (mhz[bins - 1] - mhz[0]) / (bins - 1) as f64
    } else {
        1.0
    };
    let levels = clip_levels(matrix);
    let mut builder = ChartBuilder::on(area);
    builder.margin(6);
    if style.labels {
        builder
            .caption(caption, ("sans-serif", caption_size).into_font().color(&WHITE))
            .set_label_area_size(LabelAreaPosition::Left, 40)
            .set_label_area_size(LabelAreaPosition::Bottom, 30);
    }
    let mut chart = builder.build_cartesian_2d(
        mhz[0]..mhz[bins - 1] + bin_width,
        0f64..depth as f64,
    )?;
    if style.labels {
        chart
            .configure_mesh()
            .disable_mesh()
            .x_desc("Frequency (MHz)")
            .y_desc("Time")
            .label_style(("sans-serif", 11).into_font().color(&WHITE))
            .axis_desc_style(("sans-serif", 12).into_font().color(&WHITE))
            .draw()?;
    }
    // Pool adjacent bins (max) so there are never more columns than pixels.
    let pool = bins.div_ceil(style.width.max(1) as usize).max(1);
    let data = matrix.as_array();
    let mut cells = Vec::with_capacity(depth * bins.div_ceil(pool));
    for (r, row) in data.outer_iter().enumerate() {
        for start in (0..bins).step_by(pool) {
            let end = (start + pool).min(bins);
            let peak = row
                .iter()
                .skip(start)
                .take(end - start)
                .fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
            let [red, green, blue] = heat_color(normalize(peak, levels));
            cells.push(Rectangle::new(
                [
                    (mhz[start], r as f64),
                    (mhz[end - 1] + bin_width, r as f64 + 1.0),
                ],
                RGBColor(red, green, blue).filled(),
            ));
        }
    }
    chart.draw_series(cells)?;
    Ok(())
}
fn draw_placeholder<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    caption: &str,
    style: &PlotStyle,
) -> Result<(), ScanError>
where
    DB::ErrorType: 'static,
{
    let (w, h) = area.dim_in_pixel();
    area.draw(&Rectangle::new(
        [(4, 4), (w as i32 - 4, h as i32 - 4)],
        WHITE.mix(0.3).stroke_width(1),
    ))?;
    if style.labels {
        area.draw(&Text::new(
            caption.to_string(),
            (w as i32 / 2 - 60, h as i32 / 2),
            ("sans-serif", 16).into_font().color(&WHITE),
        ))?;
    }
    Ok(())
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ScanError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| ScanError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
/// Creates `out_dir` if needed; used by front ends before handing it to a `PngSink`.
pub fn ensure_dir(out_dir: &Path) -> Result<(), ScanError> {
    std::fs::create_dir_all(out_dir)
        .map_err(|e| ScanError::Plot(format!("failed to create {}: {e}", out_dir.display())))
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::buffer::filled_matrix;
    use crate::scanner::channel::ChannelTable;
    use crate::scanner::fft::frequency_axis;
    use crate::scanner::session::ScanSession;
    use crate::scanner::sink::present;
    fn quiet_style() -> PlotStyle {
        PlotStyle {
            width: 320,
            height: 160,
            labels: false,
            ..PlotStyle::default()
        }
    }
    fn is_png(bytes: &[u8]) -> bool {
        bytes.starts_with(&[0x89, b'P', b'N', b'G'])
    }
    #[test]
    fn waterfall_and_spectrum_render_png() {
        let matrix = filled_matrix(12, 64, |r, c| -90.0 + ((r + c) % 7) as f64);
        let axis = frequency_axis(2.437e9, 30e6, 64);
        let style = quiet_style();
        let waterfall = render_waterfall_png(&matrix, &axis, "CH6", &style).unwrap();
        let spectrum = render_spectrum_png(&matrix.latest().unwrap(), &axis, "CH6", &style).unwrap();
        assert!(is_png(&waterfall));
        assert!(is_png(&spectrum));
    }
    #[test]
    fn bar_chart_renders_with_nothing_scanned() {
        let ids: Vec<u32> = (1..=13).collect();
        let png = render_bar_png(&ids, &[0.0; 13], &[false; 13], &quiet_style()).unwrap();
        assert!(is_png(&png));
    }
    #[test]
    fn mismatched_axis_is_a_plot_error() {
        let axis = frequency_axis(2.437e9, 30e6, 32);
        assert!(matches!(
            render_spectrum_png(&[0.0; 16], &axis, "CH6", &quiet_style()),
            Err(ScanError::Plot(_))
        ));
    }
    #[test]
    fn png_sink_writes_files_for_a_view() {
        let dir = std::env::temp_dir().join(format!("chanscope-plot-{}", std::process::id()));
        ensure_dir(&dir).unwrap();
        let session = ScanSession::new(ChannelTable::wifi_24ghz(), 30e6, 32, 4).unwrap();
        session
            .store()
            .update(0, filled_matrix(4, 32, |r, c| (r * c) as f64))
            .unwrap();
        let mut sink = PngSink::new(&dir, quiet_style());
        present(&mut sink, &session.current_view()).unwrap();
        present(&mut sink, &session.view_of(1).unwrap()).unwrap();
        let views: Vec<ChannelView> = (0..13).map(|i| session.view_of(i).unwrap()).collect();
        sink.render_overview(&views).unwrap();
        let names: Vec<String> = sink
            .written()
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        assert!(names.contains(&"waterfall_ch1.png".to_string()));
        assert!(names.contains(&"spectrum_ch1.png".to_string()));
        assert!(names.contains(&"waterfall_ch2.png".to_string()));
        assert!(names.contains(&"overview.png".to_string()));
        assert!(sink.written().iter().all(|p| p.exists()));
        std::fs::remove_dir_all(&dir).ok();
    }
}
