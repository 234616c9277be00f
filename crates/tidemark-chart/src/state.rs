//! Immutable chart state and its transitions.
//!
//! [`ChartsState`] is a tree of `Arc`-shared maps. Every transition takes
//! `&self` and returns a new state that copies only the map it touches;
//! everything else is shared with the input. A transition aimed at an
//! unknown chart or axis returns a state that shares every map with the
//! input, which [`ChartsState::ptr_eq`] reports as unchanged.

use crate::error::ChartError;
use crate::range::{bounding_time_range, bounding_value_range};
use crate::series::{DataSeries, SeriesList};
use crate::types::{AxisKey, ChartId, Selection, TimeRange, ValueRange, Viewport};
use ahash::AHashMap;
use std::sync::Arc;

/// One chart: its series and the axis keys it reads viewports from.
#[derive(Debug, Clone)]
pub struct ChartState {
    pub id: ChartId,
    pub series: SeriesList,
    pub time_axis: AxisKey,
    pub value_axis: AxisKey,
    /// When off, a brush selects the full visible time range.
    pub enable_time_select: bool,
    /// When off, a brush selects the full visible value range.
    pub enable_value_select: bool,
}

/// Where a brush gesture is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    /// Pointer still down: show the selection.
    InProgress,
    /// Pointer released: the selection becomes the viewport.
    Done,
    /// Gesture abandoned: drop the selection.
    Cancelled,
}

type Shared<K, V> = Arc<AHashMap<K, V>>;

/// The state of every chart, keyed by chart id and axis key.
#[derive(Debug, Clone, Default)]
pub struct ChartsState {
    charts: Shared<ChartId, Arc<ChartState>>,
    time_viewports: Shared<AxisKey, TimeRange>,
    value_viewports: Shared<AxisKey, ValueRange>,
    time_selections: Shared<AxisKey, TimeRange>,
    value_selections: Shared<AxisKey, ValueRange>,
}

impl ChartsState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `self` and `other` share every map, i.e. no transition
    /// between them changed anything.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.charts, &other.charts)
            && Arc::ptr_eq(&self.time_viewports, &other.time_viewports)
            && Arc::ptr_eq(&self.value_viewports, &other.value_viewports)
            && Arc::ptr_eq(&self.time_selections, &other.time_selections)
            && Arc::ptr_eq(&self.value_selections, &other.value_selections)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn chart(&self, id: ChartId) -> Option<&Arc<ChartState>> {
        self.charts.get(&id)
    }

    pub fn chart_ids(&self) -> impl Iterator<Item = ChartId> + '_ {
        self.charts.keys().copied()
    }

    pub fn series_of(&self, id: ChartId) -> Option<&SeriesList> {
        self.charts.get(&id).map(|chart| &chart.series)
    }

    pub fn time_viewport_of(&self, axis: AxisKey) -> Option<TimeRange> {
        self.time_viewports.get(&axis).copied()
    }

    pub fn value_viewport_of(&self, axis: AxisKey) -> Option<ValueRange> {
        self.value_viewports.get(&axis).copied()
    }

    /// The chart's viewport, assembled from its two axis keys.
    pub fn viewport_of_chart(&self, id: ChartId) -> Option<Viewport> {
        let chart = self.charts.get(&id)?;
        Some(Viewport::from_ranges(
            self.time_viewport_of(chart.time_axis)?,
            self.value_viewport_of(chart.value_axis)?,
        ))
    }

    pub fn time_selection_of(&self, axis: AxisKey) -> Option<TimeRange> {
        self.time_selections.get(&axis).copied()
    }

    pub fn value_selection_of(&self, axis: AxisKey) -> Option<ValueRange> {
        self.value_selections.get(&axis).copied()
    }

    /// The chart's selection, `None` when neither axis has one.
    pub fn selection_of_chart(&self, id: ChartId) -> Option<Selection> {
        let chart = self.charts.get(&id)?;
        let selection = Selection {
            time: self.time_selection_of(chart.time_axis),
            value: self.value_selection_of(chart.value_axis),
        };
        (!selection.is_empty()).then_some(selection)
    }

    // =========================================================================
    // Chart data
    // =========================================================================

    /// Assign series to a chart, creating it with default axis keys if new.
    pub fn set_chart_data(&self, chart: ChartId, series: SeriesList) -> Result<Self, ChartError> {
        let axis = AxisKey::for_chart(chart);
        self.set_chart_data_with_axes(chart, series, axis, axis)
    }

    /// Assign series to a chart.
    ///
    /// A known chart only has its series replaced; its axes and viewports
    /// stay as they are. A new chart is created on the given axes, and each
    /// axis that has no viewport yet is seeded with the bounding range of
    /// `series`. Axes that already have a viewport keep it, so a chart
    /// joining a shared axis does not reset the other charts on it.
    pub fn set_chart_data_with_axes(
        &self,
        chart: ChartId,
        series: SeriesList,
        time_axis: AxisKey,
        value_axis: AxisKey,
    ) -> Result<Self, ChartError> {
        if let Some(existing) = self.charts.get(&chart) {
            if existing.series.id() == series.id() {
                return Ok(self.clone());
            }
            let updated = ChartState {
                series,
                ..ChartState::clone(existing)
            };
            let mut next = self.clone();
            Arc::make_mut(&mut next.charts).insert(chart, Arc::new(updated));
            return Ok(next);
        }

        let mut next = self.clone();
        if !self.time_viewports.contains_key(&time_axis) {
            let range = bounding_time_range(&series)?;
            Arc::make_mut(&mut next.time_viewports).insert(time_axis, range);
        }
        if !self.value_viewports.contains_key(&value_axis) {
            let range = bounding_value_range(&series)?;
            Arc::make_mut(&mut next.value_viewports).insert(value_axis, range);
        }

        tracing::debug!(?chart, ?time_axis, ?value_axis, series = series.len(), "created chart");
        Arc::make_mut(&mut next.charts).insert(
            chart,
            Arc::new(ChartState {
                id: chart,
                series,
                time_axis,
                value_axis,
                enable_time_select: true,
                enable_value_select: true,
            }),
        );
        Ok(next)
    }

    /// Turn brush selection on either axis of a chart on or off.
    pub fn set_selection_enabled(&self, chart: ChartId, time: bool, value: bool) -> Self {
        let Some(existing) = self.charts.get(&chart) else {
            return self.clone();
        };
        if existing.enable_time_select == time && existing.enable_value_select == value {
            return self.clone();
        }

        let updated = ChartState {
            enable_time_select: time,
            enable_value_select: value,
            ..ChartState::clone(existing)
        };
        let mut next = self.clone();
        Arc::make_mut(&mut next.charts).insert(chart, Arc::new(updated));
        next
    }

    fn uses_time_axis(&self, axis: AxisKey) -> bool {
        self.charts.values().any(|chart| chart.time_axis == axis)
    }

    fn uses_value_axis(&self, axis: AxisKey) -> bool {
        self.charts.values().any(|chart| chart.value_axis == axis)
    }

    fn series_on_axis(&self, matches: impl Fn(&ChartState) -> bool) -> Vec<Arc<DataSeries>> {
        self.charts
            .values()
            .filter(|chart| matches(chart))
            .flat_map(|chart| chart.series.iter().cloned())
            .collect()
    }

    // =========================================================================
    // Viewports
    // =========================================================================

    /// Fit the time viewport to every series on charts using `axis`.
    pub fn reset_time_viewport(&self, axis: AxisKey) -> Self {
        let series = self.series_on_axis(|chart| chart.time_axis == axis);
        match bounding_time_range(&series) {
            Ok(range) => self.set_time_viewport(axis, range),
            Err(_) => self.clone(),
        }
    }

    /// Fit the value viewport to every series on charts using `axis`.
    pub fn reset_value_viewport(&self, axis: AxisKey) -> Self {
        let series = self.series_on_axis(|chart| chart.value_axis == axis);
        match bounding_value_range(&series) {
            Ok(range) => self.set_value_viewport(axis, range),
            Err(_) => self.clone(),
        }
    }

    /// Replace the time viewport on `axis`. Ignored unless some chart uses
    /// `axis` and `range` is finite with `min_time < max_time`.
    pub fn set_time_viewport(&self, axis: AxisKey, range: TimeRange) -> Self {
        if !self.uses_time_axis(axis) || !valid_range(range.is_valid(), &range) {
            return self.clone();
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.time_viewports).insert(axis, range);
        next
    }

    /// Value-axis counterpart of [`ChartsState::set_time_viewport`].
    pub fn set_value_viewport(&self, axis: AxisKey, range: ValueRange) -> Self {
        if !self.uses_value_axis(axis) || !valid_range(range.is_valid(), &range) {
            return self.clone();
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.value_viewports).insert(axis, range);
        next
    }

    /// Scale the time viewport about its midpoint. `factor < 1` zooms in.
    pub fn zoom_time_viewport(&self, axis: AxisKey, factor: f64) -> Self {
        if !valid_zoom(factor) {
            return self.clone();
        }
        match self.time_viewport_of(axis) {
            Some(range) => self.set_time_viewport(axis, range.zoom(factor)),
            None => self.clone(),
        }
    }

    /// Scale the value viewport about its midpoint. `factor < 1` zooms in.
    pub fn zoom_value_viewport(&self, axis: AxisKey, factor: f64) -> Self {
        if !valid_zoom(factor) {
            return self.clone();
        }
        match self.value_viewport_of(axis) {
            Some(range) => self.set_value_viewport(axis, range.zoom(factor)),
            None => self.clone(),
        }
    }

    pub fn pan_time_viewport(&self, axis: AxisKey, delta: f64) -> Self {
        match self.time_viewport_of(axis) {
            Some(range) if delta.is_finite() => self.set_time_viewport(axis, range.pan(delta)),
            _ => self.clone(),
        }
    }

    pub fn pan_value_viewport(&self, axis: AxisKey, delta: f64) -> Self {
        match self.value_viewport_of(axis) {
            Some(range) if delta.is_finite() => self.set_value_viewport(axis, range.pan(delta)),
            _ => self.clone(),
        }
    }

    // =========================================================================
    // Selections
    // =========================================================================

    /// Replace the time selection on `axis`; `None` clears it.
    pub fn set_time_selection(&self, axis: AxisKey, selection: Option<TimeRange>) -> Self {
        if selection.is_some() && !self.uses_time_axis(axis) {
            return self.clone();
        }
        if selection.is_none() && !self.time_selections.contains_key(&axis) {
            return self.clone();
        }
        let mut next = self.clone();
        let map = Arc::make_mut(&mut next.time_selections);
        match selection {
            Some(range) => map.insert(axis, range),
            None => map.remove(&axis),
        };
        next
    }

    /// Replace the value selection on `axis`; `None` clears it.
    pub fn set_value_selection(&self, axis: AxisKey, selection: Option<ValueRange>) -> Self {
        if selection.is_some() && !self.uses_value_axis(axis) {
            return self.clone();
        }
        if selection.is_none() && !self.value_selections.contains_key(&axis) {
            return self.clone();
        }
        let mut next = self.clone();
        let map = Arc::make_mut(&mut next.value_selections);
        match selection {
            Some(range) => map.insert(axis, range),
            None => map.remove(&axis),
        };
        next
    }

    /// Apply one step of a time brush gesture.
    ///
    /// `InProgress` shows `range` as the selection, `Done` makes it the
    /// viewport and clears the selection, `Cancelled` only clears. A `Done`
    /// range that is not a valid viewport is treated as `Cancelled`.
    pub fn apply_time_selection(
        &self,
        axis: AxisKey,
        phase: SelectionPhase,
        range: Option<TimeRange>,
    ) -> Self {
        match (phase, range) {
            (SelectionPhase::InProgress, range) => self.set_time_selection(axis, range),
            (SelectionPhase::Done, Some(range)) if range.is_valid() => self
                .set_time_viewport(axis, range)
                .set_time_selection(axis, None),
            (SelectionPhase::Done, _) | (SelectionPhase::Cancelled, _) => {
                self.set_time_selection(axis, None)
            }
        }
    }

    /// Value-axis counterpart of [`ChartsState::apply_time_selection`].
    pub fn apply_value_selection(
        &self,
        axis: AxisKey,
        phase: SelectionPhase,
        range: Option<ValueRange>,
    ) -> Self {
        match (phase, range) {
            (SelectionPhase::InProgress, range) => self.set_value_selection(axis, range),
            (SelectionPhase::Done, Some(range)) if range.is_valid() => self
                .set_value_viewport(axis, range)
                .set_value_selection(axis, None),
            (SelectionPhase::Done, _) | (SelectionPhase::Cancelled, _) => {
                self.set_value_selection(axis, None)
            }
        }
    }
}

fn valid_zoom(factor: f64) -> bool {
    let valid = factor.is_finite() && factor > 0.0;
    if !valid {
        tracing::warn!(factor, "ignoring zoom with non-positive or non-finite factor");
    }
    valid
}

fn valid_range(valid: bool, range: &impl std::fmt::Debug) -> bool {
    if !valid {
        tracing::warn!(?range, "ignoring viewport that is empty, inverted or non-finite");
    }
    valid
}
