//! tidemark - GPU time-series charts
//!
//! Large line, band and scatter series rendered through wgpu, with pan,
//! zoom and rectangular brush selection driven by an immutable state engine.
//!
//! - [`chart`]: series, geometry, state engine, render cache and renderer
//! - [`render`]: the wgpu [`GraphicsContext`](render::GraphicsContext)
//! - [`core`]: logging, profiling and [`Config`]
//!
//! # Quick Start
//!
//! ```no_run
//! use tidemark::prelude::*;
//!
//! tidemark::init(&Config::default());
//!
//! let ctx = GraphicsContext::new_owned_sync()?;
//! let mut renderer = ChartRenderer::new(
//!     &ctx,
//!     wgpu::TextureFormat::Bgra8UnormSrgb,
//!     RendererConfig::default(),
//! )?;
//!
//! let mut store = ChartStore::new();
//! let series = DataSeries::line(vec![0.0, 1.0, 2.0, 1.0, 0.0]).build()?;
//! store.try_execute(|s| s.set_chart_data(ChartId(1), SeriesList::new([series])))?;
//! store.execute(|s| s.zoom_time_viewport(AxisKey(1), 0.5));
//!
//! // Each frame, with `view` the surface texture view:
//! # let view: wgpu::TextureView = todo!();
//! renderer.encode_frame(&ctx, &view, None, store.state(), ChartId(1), [800, 600]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use tidemark_chart as chart;
pub use tidemark_core as core;
pub use tidemark_render as render;

pub use tidemark_core::{Config, ProfilingMode};
pub use tidemark_render::wgpu;

/// Install logging and profiling as described by `config`.
pub fn init(config: &Config) {
    tidemark_core::init(config);
    tracing::debug!(?config, "tidemark initialised");
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{Config, ProfilingMode, wgpu};

    pub use tidemark_chart::{
        AxisKey, BandTopology, BrushGesture, ChartError, ChartId, ChartRenderer, ChartStore,
        ChartsState, DataPoint, DataSeries, GeometryConfig, LineStyle, RenderError,
        RendererConfig, Selection, SelectionPhase, SeriesKind, SeriesList, TimeRange,
        ValueRange, Viewport,
    };
    pub use tidemark_render::{Color, GraphicsContext, GraphicsContextDescriptor};
}
