use crate::scanner::buffer::WaterfallMatrix;
use crate::scanner::session::{ChannelView, ViewData};
use crate::scanner::ScanError;
/// Waterfall colour limits are taken from these percentiles of the matrix being drawn.
pub const CLIP_LOW_PERCENTILE: f64 = 10.0;
pub const CLIP_HIGH_PERCENTILE: f64 = 99.0;
/// Headroom above and below the scanned channels in the aggregate bar chart, in dB.
pub const BAR_MARGIN_DB: f64 = 5.0;
/// Something that can draw what the scanner computed. Never read back from.
pub trait DisplaySink {
    /// `scanned[i]` is false for channels without data; their values are meaningless.
    fn render_aggregate_bar(
        &mut self,
        channel_ids: &[u32],
        values: &[f64],
        scanned: &[bool],
    ) -> Result<(), ScanError>;
    fn render_waterfall(
        &mut self,
        matrix: &WaterfallMatrix,
        frequency_axis: &[f64],
        label: &str,
    ) -> Result<(), ScanError>;
    fn render_spectrum_line(
        &mut self,
        line: &[f64],
        frequency_axis: &[f64],
        label: &str,
    ) -> Result<(), ScanError>;
    /// Channel never scanned.
    fn render_placeholder(&mut self, label: &str) -> Result<(), ScanError>;
    /// Called before the channel plots; `failed` marks a failed latest attempt.
    fn render_scan_status(&mut self, _label: &str, _failed: bool) -> Result<(), ScanError> {
        Ok(())
    }
}
/// Pushes one view through a sink: status, bar chart, then waterfall and
/// instantaneous spectrum (or the placeholder).
pub fn present<S: DisplaySink + ?Sized>(sink: &mut S, view: &ChannelView) -> Result<(), ScanError> {
    let label = view.label();
    sink.render_scan_status(&label, view.last_scan_failed)?;
    sink.render_aggregate_bar(&view.channel_ids, &view.aggregate_vector, &view.scanned)?;
    match &view.data {
        ViewData::NoData => sink.render_placeholder(&label),
        ViewData::Waterfall {
            matrix,
            frequency_axis,
        } => {
            sink.render_waterfall(matrix, frequency_axis, &label)?;
            if let Some(latest) = matrix.latest() {
                sink.render_spectrum_line(&latest, frequency_axis, &label)?;
            }
            Ok(())
        }
    }
}
/// Linear-interpolated percentile of unsorted values, `p` in 0..=100.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
/// Colour scale limits for a waterfall, recomputed for every render.
pub fn clip_levels(matrix: &WaterfallMatrix) -> (f64, f64) {
    let values: Vec<f64> = matrix.values().collect();
    let low = percentile(&values, CLIP_LOW_PERCENTILE).unwrap_or(0.0);
    let high = percentile(&values, CLIP_HIGH_PERCENTILE).unwrap_or(1.0);
    if high > low {
        (low, high)
    } else {
        (low - 1.0, low + 1.0)
    }
}
/// Y range of the aggregate bar chart over scanned channels only.
pub fn bar_range(values: &[f64], scanned: &[bool]) -> Option<(f64, f64)> {
    let (min, max) = values
        .iter()
        .zip(scanned)
        .filter(|(_, scanned)| **scanned)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (&v, _)| {
            (lo.min(v), hi.max(v))
        });
    (min <= max).then(|| (min - BAR_MARGIN_DB, max + BAR_MARGIN_DB))
}
/// Viridis-style colour for `t` in 0..=1 (clamped).
pub fn heat_color(t: f64) -> [u8; 3] {
    const STOPS: [[f64; 3]; 5] = [
        [68.0, 1.0, 84.0],
        [59.0, 82.0, 139.0],
        [33.0, 145.0, 140.0],
        [94.0, 201.0, 98.0],
        [253.0, 231.0, 37.0],
    ];
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (STOPS.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(STOPS.len() - 2);
    let frac = scaled - i as f64;
    let mut rgb = [0u8; 3];
    for (k, channel) in rgb.iter_mut().enumerate() {
        let v = STOPS[i][k] + (STOPS[i + 1][k] - STOPS[i][k]) * frac;
        *channel = v.round().clamp(0.0, 255.0) as u8;
    }
    rgb
}
/// Maps a dB value into 0..=1 within the clip limits.
pub fn normalize(value: f64, (low, high): (f64, f64)) -> f64 {
    ((value - low) / (high - low)).clamp(0.0, 1.0)
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::buffer::filled_matrix;
    use crate::scanner::channel::ChannelTable;
    use crate::scanner::session::ScanSession;
    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<String>,
    }
    impl DisplaySink for RecordingSink {
        fn render_aggregate_bar(
            &mut self,
            channel_ids: &[u32],
            _values: &[f64],
            scanned: &[bool],
        ) -> Result<(), ScanError> {
            let count = scanned.iter().filter(|s| **s).count();
            self.calls
                .push(format!("bar {} {}", channel_ids.len(), count));
            Ok(())
        }
        fn render_waterfall(
            &mut self,
            matrix: &WaterfallMatrix,
            frequency_axis: &[f64],
            label: &str,
        ) -> Result<(), ScanError> {
            assert_eq!(matrix.frame_size(), frequency_axis.len());
            self.calls.push(format!("waterfall {label} {}", matrix.depth()));
            Ok(())
        }
        fn render_spectrum_line(
            &mut self,
            line: &[f64],
            frequency_axis: &[f64],
            label: &str,
        ) -> Result<(), ScanError> {
            assert_eq!(line.len(), frequency_axis.len());
            self.calls.push(format!("line {label}"));
            Ok(())
        }
        fn render_placeholder(&mut self, label: &str) -> Result<(), ScanError> {
            self.calls.push(format!("placeholder {label}"));
            Ok(())
        }
        fn render_scan_status(&mut self, label: &str, failed: bool) -> Result<(), ScanError> {
            self.calls.push(format!("status {label} {failed}"));
            Ok(())
        }
    }
    #[test]
    fn present_renders_placeholder_for_unscanned() {
        let session = ScanSession::new(ChannelTable::wifi_24ghz(), 30e6, 8, 2).unwrap();
        let mut sink = RecordingSink::default();
        present(&mut sink, &session.current_view()).unwrap();
        assert_eq!(
            sink.calls,
            vec!["status CH1 false", "bar 13 0", "placeholder CH1"]
        );
    }
    #[test]
    fn present_renders_waterfall_and_latest_line() {
        let session = ScanSession::new(ChannelTable::wifi_24ghz(), 30e6, 8, 2).unwrap();
        session
            .store()
            .update(0, filled_matrix(2, 8, |r, _| r as f64))
            .unwrap();
        session.store().mark_failed(0).unwrap();
        let mut sink = RecordingSink::default();
        present(&mut sink, &session.current_view()).unwrap();
        assert_eq!(
            sink.calls,
            vec!["status CH1 true", "bar 13 1", "waterfall CH1 2", "line CH1"]
        );
    }
    #[test]
    fn percentile_interpolates_like_numpy() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        assert!((percentile(&values, 10.0).unwrap() - 1.9).abs() < 1e-12);
        assert!((percentile(&values, 99.0).unwrap() - 9.91).abs() < 1e-12);
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&[], 50.0), None);
    }
    #[test]
    fn flat_matrix_gets_non_empty_clip_range() {
        let matrix = filled_matrix(3, 3, |_, _| -70.0);
        let (low, high) = clip_levels(&matrix);
        assert!(high > low);
        assert_eq!(normalize(-70.0, (low, high)), 0.5);
    }
    #[test]
    fn bar_range_ignores_unscanned() {
        let values = [0.0, -80.0, -60.0];
        let scanned = [false, true, true];
        assert_eq!(bar_range(&values, &scanned), Some((-85.0, -55.0)));
        assert_eq!(bar_range(&values, &[false; 3]), None);
    }
    #[test]
    fn heat_color_endpoints() {
        assert_eq!(heat_color(0.0), [68, 1, 84]);
        assert_eq!(heat_color(1.0), [253, 231, 37]);
        assert_eq!(heat_color(f64::NAN), [68, 1, 84]);
    }
}
