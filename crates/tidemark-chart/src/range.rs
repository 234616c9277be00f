//! Bounding ranges of series, used to seed and reset viewports.

use crate::error::ChartError;
use crate::series::{DataSeries, SeriesKind};
use crate::types::{TimeRange, ValueRange};
use std::sync::Arc;

/// Time covered by `series`.
///
/// Bands cover one full sample step per pair, so their range ends at
/// `start + spacing * pairs`. Lines and dots end at their last sample,
/// `start + spacing * (samples - 1)`. The result may be zero-width; callers
/// seeding a viewport pad it with [`TimeRange::padded_if_degenerate`].
pub fn time_range_for_series(series: &DataSeries) -> TimeRange {
    let steps = match series.kind() {
        SeriesKind::MinMax => series.logical_len(),
        SeriesKind::Line | SeriesKind::Dots => series.logical_len().saturating_sub(1),
    };
    let start = series.start_time();
    TimeRange::new(start, start + series.sample_spacing() * steps as f64)
}

/// Smallest and largest sample, ignoring NaN.
///
/// `None` when the series has no comparable samples.
pub fn value_range_for_series(series: &DataSeries) -> Option<ValueRange> {
    let (min, max) = series
        .samples()
        .iter()
        .filter(|v| !v.is_nan())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &v| {
            (min.min(v), max.max(v))
        });

    (min <= max).then(|| ValueRange::new(min, max))
}

/// Union of the time ranges of every series.
pub fn bounding_time_range<'a>(
    series: impl IntoIterator<Item = &'a Arc<DataSeries>>,
) -> Result<TimeRange, ChartError> {
    series
        .into_iter()
        .map(|s| time_range_for_series(s))
        .reduce(|a, b| a.union(&b))
        .map(TimeRange::padded_if_degenerate)
        .ok_or(ChartError::EmptySeries)
}

/// Union of the value ranges of every series.
pub fn bounding_value_range<'a>(
    series: impl IntoIterator<Item = &'a Arc<DataSeries>>,
) -> Result<ValueRange, ChartError> {
    series
        .into_iter()
        .filter_map(|s| value_range_for_series(s))
        .reduce(|a, b| a.union(&b))
        .map(ValueRange::padded_if_degenerate)
        .ok_or(ChartError::EmptySeries)
}
