//! tidemark charts - GPU time-series rendering with pan, zoom and brushing
//!
//! This crate provides:
//! - Immutable data series with identity tokens ([`DataSeries`], [`SeriesList`])
//! - Geometry building for lines, min/max bands, dots and thick strokes
//! - An identity-keyed GPU [`RenderCache`] that only rebuilds what changed
//! - An immutable viewport and selection state engine ([`ChartsState`])
//! - A single-writer [`ChartStore`] and the [`BrushGesture`] helper
//! - A thin per-chart [`ChartRenderer`]
//!
//! # Example
//!
//! ```
//! use tidemark_chart::*;
//!
//! let series = DataSeries::line(vec![0.0, 1.0, 2.0, 1.0, 0.0]).build()?;
//! let state = ChartsState::new().set_chart_data(ChartId(1), SeriesList::new([series]))?;
//!
//! let zoomed = state.zoom_time_viewport(AxisKey::for_chart(ChartId(1)), 0.5);
//! assert_eq!(zoomed.time_viewport_of(AxisKey(1)), Some(TimeRange::new(1.0, 3.0)));
//! # Ok::<(), ChartError>(())
//! ```

// Data
mod error;
mod range;
mod series;
mod types;

// State
mod brush;
mod state;
mod store;

// Rendering
pub mod geometry;
mod cache;
mod draw_state;
mod pipeline;
mod renderer;

pub use error::ChartError;
pub use range::*;
pub use series::*;
pub use types::*;

pub use brush::BrushGesture;
pub use state::*;
pub use store::*;

pub use cache::*;
pub use draw_state::*;
pub use geometry::{BandTopology, DrawMode, Geometry, GeometryConfig, LineStyle};
pub use pipeline::*;
pub use renderer::*;
