//! Display-ready views of the rolling store.
//!
//! X values are always logical store indices, so a selection made on one
//! view still names the same frames after the scale coefficients change.
use serde::Serialize;
use crate::drivers::{RollingStore, SampleFrame};
/// Most points `range_series` will return, and the no-decimation ceiling for `display_series`.
pub const MAX_RANGE_POINTS: usize = 50_000;
/// Above this many stored frames `display_series` switches to peak picking.
pub const PEAK_PRESERVING_THRESHOLD: usize = 100_000;
/// Output budget for `display_series` given `total` stored frames.
pub fn target_points(total: usize) -> usize {
    match total {
        t if t > 500_000 => 5_000,
        t if t > 200_000 => 10_000,
        t if t > 100_000 => 20_000,
        t if t > MAX_RANGE_POINTS => 25_000,
        _ => MAX_RANGE_POINTS,
    }
}
/// One x column plus one column per channel, all the same length.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DisplaySeries {
    pub x: Vec<f64>,
    pub channels: Vec<Vec<f64>>,
}
impl DisplaySeries {
    pub fn len(&self) -> usize {
        self.x.len()
    }
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
    /// `[x, ch0, ch1, ...]`, the layout chart widgets usually take.
    pub fn into_columns(self) -> Vec<Vec<f64>> {
        let mut columns = Vec::with_capacity(self.channels.len() + 1);
        columns.push(self.x);
        columns.extend(self.channels);
        columns
    }
}
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SelectionStats {
    pub point_count: usize,
    pub duration_ms: f64,
    pub frequency_hz: f64,
    /// NaN fields for channels that have no samples in the range.
    pub channels: Vec<ChannelSummary>,
}
/// Scale for `channel`; missing or non-finite coefficients fall back to 1.
pub fn coefficient(coefficients: &[f64], channel: usize) -> f64 {
    coefficients
        .get(channel)
        .copied()
        .filter(|c| c.is_finite())
        .unwrap_or(1.0)
}
struct SeriesBuilder {
    scales: Vec<f64>,
    series: DisplaySeries,
}
impl SeriesBuilder {
    fn new(channel_count: usize, coefficients: &[f64], expected: usize) -> Self {
        Self {
            scales: (0..channel_count)
                .map(|ch| coefficient(coefficients, ch))
                .collect(),
            series: DisplaySeries {
                x: Vec::with_capacity(expected),
                channels: vec![Vec::with_capacity(expected); channel_count],
            },
        }
    }
    fn push(&mut self, index: usize, frame: &SampleFrame) {
        self.series.x.push(index as f64);
        for (ch, column) in self.series.channels.iter_mut().enumerate() {
            // Channels the frame lacks become gaps.
            let raw = frame.values.get(ch).copied().unwrap_or(f64::NAN);
            column.push(raw * self.scales[ch]);
        }
    }
    fn finish(self) -> Option<DisplaySeries> {
        if self.series.is_empty() {
            None
        } else {
            Some(self.series)
        }
    }
}
/// Whole-store view bounded by [`target_points`].
pub fn display_series(
    store: &RollingStore,
    channel_count: usize,
    coefficients: &[f64],
) -> Option<DisplaySeries> {
    let total = store.len();
    let target = target_points(total);
    if total <= target {
        let mut builder = SeriesBuilder::new(channel_count, coefficients, total);
        for (index, frame) in store.iter().enumerate() {
            builder.push(index, frame);
        }
        return builder.finish();
    }
    let stride = total.div_ceil(target);
    let mut builder = SeriesBuilder::new(channel_count, coefficients, target);
    if total > PEAK_PRESERVING_THRESHOLD {
        // One winner per bucket, chosen across all channels together.
        for start in (0..total).step_by(stride) {
            let end = (start + stride).min(total);
            let mut best = start;
            let mut best_peak = f64::NEG_INFINITY;
            for index in start..end {
                if let Some(frame) = store.get(index) {
                    let peak = frame.peak_magnitude(channel_count);
                    if peak > best_peak {
                        best = index;
                        best_peak = peak;
                    }
                }
            }
            if let Some(frame) = store.get(best) {
                builder.push(best, frame);
            }
        }
    } else {
        for index in (0..total).step_by(stride) {
            if let Some(frame) = store.get(index) {
                builder.push(index, frame);
            }
        }
    }
    builder.finish()
}
/// Fixed-stride view of the closed index range `[start, end]`, at most [`MAX_RANGE_POINTS`] long.
pub fn range_series(
    store: &RollingStore,
    start: usize,
    end: usize,
    channel_count: usize,
    coefficients: &[f64],
) -> Option<DisplaySeries> {
    let (start, end) = clamp_range(store, start, end)?;
    let count = end - start + 1;
    let stride = count.div_ceil(MAX_RANGE_POINTS);
    let mut builder = SeriesBuilder::new(channel_count, coefficients, count.min(MAX_RANGE_POINTS));
    for index in (start..=end).step_by(stride) {
        if let Some(frame) = store.get(index) {
            builder.push(index, frame);
        }
    }
    builder.finish()
}
/// Duration, effective rate and scaled per-channel extremes over `[start, end]`.
pub fn selection_stats(
    store: &RollingStore,
    start: usize,
    end: usize,
    coefficients: &[f64],
) -> Option<SelectionStats> {
    let (start, end) = clamp_range(store, start, end)?;
    let point_count = end - start + 1;
    if point_count < 2 {
        return None;
    }
    let first = store.get(start)?;
    let last = store.get(end)?;
    let duration_ms = last.timestamp_ms - first.timestamp_ms;
    let frequency_hz = if duration_ms > 0.0 {
        point_count as f64 / (duration_ms / 1000.0)
    } else {
        0.0
    };
    let width = (start..=end)
        .filter_map(|i| store.get(i))
        .map(SampleFrame::channel_count)
        .max()
        .unwrap_or(0);
    let mut acc = vec![(f64::INFINITY, f64::NEG_INFINITY, 0.0f64, 0usize); width];
    for frame in (start..=end).filter_map(|i| store.get(i)) {
        for (ch, &raw) in frame.values.iter().enumerate() {
            if raw.is_nan() {
                continue;
            }
            // Scale before comparing so a negative coefficient flips min and max.
            let value = raw * coefficient(coefficients, ch);
            let (min, max, sum, n) = &mut acc[ch];
            *min = min.min(value);
            *max = max.max(value);
            *sum += value;
            *n += 1;
        }
    }
    let channels = acc
        .into_iter()
        .map(|(min, max, sum, n)| {
            if n == 0 {
                ChannelSummary {
                    min: f64::NAN,
                    max: f64::NAN,
                    avg: f64::NAN,
                }
            } else {
                ChannelSummary {
                    min,
                    max,
                    avg: sum / n as f64,
                }
            }
        })
        .collect();
    Some(SelectionStats {
        point_count,
        duration_ms,
        frequency_hz,
        channels,
    })
}
fn clamp_range(store: &RollingStore, start: usize, end: usize) -> Option<(usize, usize)> {
    let last = store.len().checked_sub(1)?;
    let end = end.min(last);
    (start <= end).then_some((start, end))
}
