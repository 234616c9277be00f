//! Immutable data series and identity-carrying series lists.

use crate::error::ChartError;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tidemark_render::Color;

static NEXT_SERIES_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_LIST_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one constructed [`DataSeries`].
///
/// Assigned from a generation counter when the series is built, so two
/// series with identical samples still have different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesId(u64);

impl SeriesId {
    fn next() -> Self {
        Self(NEXT_SERIES_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Identity of one constructed [`SeriesList`]. Clones share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListId(u64);

impl ListId {
    fn next() -> Self {
        Self(NEXT_LIST_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// How a series' samples are read and drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    /// One value per sample, joined into a line.
    Line,
    /// Interleaved `top, bottom` pairs filled as a band.
    MinMax,
    /// One value per sample, drawn as unconnected markers.
    Dots,
}

/// An immutable series of evenly spaced samples.
///
/// Built through [`SeriesBuilder`] and shared as `Arc<DataSeries>`. Updating
/// a series means building a new one.
#[derive(Debug)]
pub struct DataSeries {
    id: SeriesId,
    kind: SeriesKind,
    samples: Vec<f64>,
    colour: Color,
    start_time: f64,
    sample_spacing: f64,
    point_size: f32,
}

impl DataSeries {
    pub fn line(samples: impl Into<Vec<f64>>) -> SeriesBuilder {
        SeriesBuilder::new(SeriesKind::Line, samples.into())
    }

    pub fn dots(samples: impl Into<Vec<f64>>) -> SeriesBuilder {
        SeriesBuilder::new(SeriesKind::Dots, samples.into())
    }

    /// Band between `top[i]` and `bottom[i]`.
    pub fn min_max(top: &[f64], bottom: &[f64]) -> Result<SeriesBuilder, ChartError> {
        if top.len() != bottom.len() {
            return Err(ChartError::MismatchedBandLengths {
                top: top.len(),
                bottom: bottom.len(),
            });
        }

        let samples = top
            .iter()
            .zip(bottom)
            .flat_map(|(&t, &b)| [t, b])
            .collect::<Vec<_>>();
        Ok(SeriesBuilder::new(SeriesKind::MinMax, samples))
    }

    /// Band from already interleaved `top, bottom, top, bottom, ...` values.
    pub fn min_max_interleaved(samples: impl Into<Vec<f64>>) -> Result<SeriesBuilder, ChartError> {
        let samples = samples.into();
        if samples.len() % 2 != 0 {
            return Err(ChartError::OddInterleavedLength(samples.len()));
        }
        Ok(SeriesBuilder::new(SeriesKind::MinMax, samples))
    }

    pub fn id(&self) -> SeriesId {
        self.id
    }

    pub fn kind(&self) -> SeriesKind {
        self.kind
    }

    /// Raw samples; interleaved pairs for [`SeriesKind::MinMax`].
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn colour(&self) -> Color {
        self.colour
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn sample_spacing(&self) -> f64 {
        self.sample_spacing
    }

    /// Marker size in pixels. Only dots use it.
    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    /// Number of time steps: samples for lines and dots, pairs for bands.
    pub fn logical_len(&self) -> usize {
        match self.kind {
            SeriesKind::Line | SeriesKind::Dots => self.samples.len(),
            SeriesKind::MinMax => self.samples.len() / 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Builder for [`DataSeries`]. Validation and id assignment happen in
/// [`SeriesBuilder::build`].
#[derive(Debug, Clone)]
pub struct SeriesBuilder {
    kind: SeriesKind,
    samples: Vec<f64>,
    colour: Color,
    start_time: f64,
    sample_spacing: f64,
    point_size: f32,
}

impl SeriesBuilder {
    pub const DEFAULT_POINT_SIZE: f32 = 4.0;

    fn new(kind: SeriesKind, samples: Vec<f64>) -> Self {
        Self {
            kind,
            samples,
            colour: Color::WHITE,
            start_time: 0.0,
            sample_spacing: 1.0,
            point_size: Self::DEFAULT_POINT_SIZE,
        }
    }

    pub fn colour(mut self, colour: Color) -> Self {
        self.colour = colour;
        self
    }

    pub fn start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn sample_spacing(mut self, spacing: f64) -> Self {
        self.sample_spacing = spacing;
        self
    }

    pub fn point_size(mut self, size: f32) -> Self {
        self.point_size = size;
        self
    }

    pub fn build(self) -> Result<Arc<DataSeries>, ChartError> {
        if !self.sample_spacing.is_finite() || self.sample_spacing <= 0.0 {
            return Err(ChartError::InvalidSpacing(self.sample_spacing));
        }
        if !self.point_size.is_finite() || self.point_size < 0.0 {
            return Err(ChartError::InvalidPointSize(self.point_size));
        }

        Ok(Arc::new(DataSeries {
            id: SeriesId::next(),
            kind: self.kind,
            samples: self.samples,
            colour: self.colour,
            start_time: self.start_time,
            sample_spacing: self.sample_spacing,
            point_size: self.point_size,
        }))
    }
}

/// An immutable, ordered list of series with its own identity.
///
/// The render cache skips all work when handed a list with the same
/// [`ListId`] as last time, so a list must be rebuilt (not cloned) whenever
/// its contents change. Every constructor here assigns a fresh id.
#[derive(Debug, Clone)]
pub struct SeriesList {
    id: ListId,
    series: Arc<[Arc<DataSeries>]>,
}

impl SeriesList {
    pub fn new(series: impl IntoIterator<Item = Arc<DataSeries>>) -> Self {
        Self {
            id: ListId::next(),
            series: series.into_iter().collect(),
        }
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    pub fn id(&self) -> ListId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<DataSeries>> {
        self.series.iter()
    }

    pub fn get(&self, id: SeriesId) -> Option<&Arc<DataSeries>> {
        self.series.iter().find(|series| series.id() == id)
    }

    pub fn contains(&self, id: SeriesId) -> bool {
        self.get(id).is_some()
    }

    /// New list with `series` appended.
    pub fn with(&self, series: Arc<DataSeries>) -> Self {
        Self::new(self.series.iter().cloned().chain(std::iter::once(series)))
    }

    /// New list without the series `id`.
    pub fn without(&self, id: SeriesId) -> Self {
        Self::new(self.series.iter().filter(|s| s.id() != id).cloned())
    }

    /// New list with the series `id` swapped for `replacement`, keeping order.
    /// A copy of `replacement` already elsewhere in the list is dropped.
    pub fn replacing(&self, id: SeriesId, replacement: Arc<DataSeries>) -> Self {
        Self::new(self.series.iter().filter_map(|s| {
            if s.id() == id {
                Some(replacement.clone())
            } else if s.id() == replacement.id() {
                None
            } else {
                Some(s.clone())
            }
        }))
    }
}

impl Default for SeriesList {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<Arc<DataSeries>> for SeriesList {
    fn from_iter<I: IntoIterator<Item = Arc<DataSeries>>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a SeriesList {
    type Item = &'a Arc<DataSeries>;
    type IntoIter = std::slice::Iter<'a, Arc<DataSeries>>;

    fn into_iter(self) -> Self::IntoIter {
        self.series.iter()
    }
}
