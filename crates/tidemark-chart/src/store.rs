//! Single-writer holder of the current [`ChartsState`].

use crate::state::ChartsState;

/// Handle returned by [`ChartStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&ChartsState)>;

/// Owns the current state and applies transitions one at a time.
///
/// ```
/// use tidemark_chart::{AxisKey, ChartId, ChartStore, DataSeries, SeriesList};
///
/// let mut store = ChartStore::new();
/// let series = DataSeries::line(vec![0.0, 1.0, 2.0]).build()?;
/// store.try_execute(|s| s.set_chart_data(ChartId(1), SeriesList::new([series])))?;
///
/// let changed = store.execute(|s| s.zoom_time_viewport(AxisKey(1), 0.5));
/// assert!(changed);
/// # Ok::<(), tidemark_chart::ChartError>(())
/// ```
#[derive(Default)]
pub struct ChartStore {
    state: ChartsState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl ChartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: ChartsState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &ChartsState {
        &self.state
    }

    /// Apply `transition`. Listeners run only when the state changed.
    /// Returns whether it changed.
    pub fn execute(&mut self, transition: impl FnOnce(&ChartsState) -> ChartsState) -> bool {
        let next = transition(&self.state);
        self.replace(next)
    }

    /// Apply a fallible transition. On error the state is untouched.
    pub fn try_execute<E>(
        &mut self,
        transition: impl FnOnce(&ChartsState) -> Result<ChartsState, E>,
    ) -> Result<bool, E> {
        let next = transition(&self.state)?;
        Ok(self.replace(next))
    }

    fn replace(&mut self, next: ChartsState) -> bool {
        if next.ptr_eq(&self.state) {
            return false;
        }
        self.state = next;
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
        true
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ChartsState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }
}

impl std::fmt::Debug for ChartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChartStore")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
