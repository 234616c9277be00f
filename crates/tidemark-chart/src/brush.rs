//! Brush gesture: pointer down/move/up mapped onto selection transitions.

use crate::state::{ChartsState, SelectionPhase};
use crate::types::{ChartId, DataPoint, TimeRange, ValueRange};

/// Tracks one rectangular brush on one chart.
///
/// The anchor (where the pointer went down) is local to the gesture and
/// never stored in [`ChartsState`]. Each method maps the pointer position
/// onto a state transition and returns the new state.
///
/// An axis with selection disabled always selects its whole current
/// viewport, so a time-only brush sweeps full-height columns.
#[derive(Debug, Clone)]
pub struct BrushGesture {
    chart: ChartId,
    anchor: Option<DataPoint>,
}

impl BrushGesture {
    pub fn new(chart: ChartId) -> Self {
        Self {
            chart,
            anchor: None,
        }
    }

    pub fn chart(&self) -> ChartId {
        self.chart
    }

    pub fn is_active(&self) -> bool {
        self.anchor.is_some()
    }

    /// Pointer down at `point`. Drops any selection left on the chart.
    pub fn begin(&mut self, state: &ChartsState, point: DataPoint) -> ChartsState {
        let next = self.clear(state);
        if state.chart(self.chart).is_some() {
            self.anchor = Some(point);
        }
        next
    }

    /// Pointer moved to `point`: show the selection so far.
    pub fn update(&mut self, state: &ChartsState, point: DataPoint) -> ChartsState {
        self.apply(state, point, SelectionPhase::InProgress)
    }

    /// Pointer released at `point`: zoom to the selection.
    ///
    /// A brush with no extent on an enabled axis is treated as a click and
    /// only clears the selection.
    pub fn end(&mut self, state: &ChartsState, point: DataPoint) -> ChartsState {
        let Some((time, value)) = self.ranges(state, point) else {
            return self.cancel(state);
        };
        if !time.is_valid() || !value.is_valid() {
            return self.cancel(state);
        }

        let next = self.apply(state, point, SelectionPhase::Done);
        self.anchor = None;
        next
    }

    /// Abandon the gesture and clear the selection.
    pub fn cancel(&mut self, state: &ChartsState) -> ChartsState {
        self.anchor = None;
        self.clear(state)
    }

    fn clear(&self, state: &ChartsState) -> ChartsState {
        let Some(chart) = state.chart(self.chart) else {
            return state.clone();
        };
        state
            .apply_time_selection(chart.time_axis, SelectionPhase::Cancelled, None)
            .apply_value_selection(chart.value_axis, SelectionPhase::Cancelled, None)
    }

    fn ranges(&self, state: &ChartsState, point: DataPoint) -> Option<(TimeRange, ValueRange)> {
        let anchor = self.anchor?;
        let chart = state.chart(self.chart)?;

        let time = if chart.enable_time_select {
            TimeRange::spanning(anchor.time, point.time)
        } else {
            state.time_viewport_of(chart.time_axis)?
        };
        let value = if chart.enable_value_select {
            ValueRange::spanning(anchor.value, point.value)
        } else {
            state.value_viewport_of(chart.value_axis)?
        };
        Some((time, value))
    }

    fn apply(&self, state: &ChartsState, point: DataPoint, phase: SelectionPhase) -> ChartsState {
        let (Some(chart), Some((time, value))) =
            (state.chart(self.chart), self.ranges(state, point))
        else {
            return state.clone();
        };
        state
            .apply_time_selection(chart.time_axis, phase, Some(time))
            .apply_value_selection(chart.value_axis, phase, Some(value))
    }
}
