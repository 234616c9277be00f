//! Per-chart frame orchestration.
//!
//! Each frame the renderer reads the chart's viewport and series list from
//! [`ChartsState`], lets the [`RenderCache`] catch up with the list, updates
//! the camera if the viewport moved, then walks the cached geometry issuing
//! draws through a [`BoundState`] tracker.

use crate::cache::RenderCache;
use crate::draw_state::{BoundState, DrawUniforms, FrameStats};
use crate::geometry::{DrawMode, GeometryConfig};
use crate::pipeline::{CameraUniform, ChartPipelines, PipelineOptions};
use crate::state::ChartsState;
use crate::types::{ChartId, Viewport};
use tidemark_core::profiling::{profile_function, profile_scope};
use tidemark_render::wgpu;
use tidemark_render::{Color, DrawEncoder, GpuError, GpuFeatures, GraphicsContext, RenderContext};

/// Errors from creating a [`ChartRenderer`].
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("shader {label:?} failed to compile: {message}")]
    ShaderCompilation {
        label: Option<String>,
        message: String,
    },

    #[error("device is missing required features: {0:?}")]
    MissingFeatures(GpuFeatures),

    #[error("push constant limit is {available} bytes, charts need {required}")]
    PushConstantLimit { required: u32, available: u32 },

    #[error(transparent)]
    Gpu(GpuError),
}

impl From<GpuError> for RenderError {
    fn from(error: GpuError) -> Self {
        match error {
            GpuError::ShaderCompilation { label, message } => {
                RenderError::ShaderCompilation { label, message }
            }
            other => RenderError::Gpu(other),
        }
    }
}

/// Renderer settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererConfig {
    pub geometry: GeometryConfig,
    pub clear_colour: Color,
    pub sample_count: u32,
    pub wireframe: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            geometry: GeometryConfig::default(),
            clear_colour: Color::WHITE,
            sample_count: 1,
            wireframe: false,
        }
    }
}

impl RendererConfig {
    pub fn with_geometry(mut self, geometry: GeometryConfig) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_clear_colour(mut self, colour: Color) -> Self {
        self.clear_colour = colour;
        self
    }

    pub fn with_sample_count(mut self, count: u32) -> Self {
        self.sample_count = count;
        self
    }

    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }
}

/// Draws one chart.
///
/// Owns the chart's [`RenderCache`], so each chart on screen gets its own
/// renderer. All methods take the context explicitly; dropping a renderer
/// without calling [`release`](Self::release) leaves buffer cleanup to wgpu.
#[derive(Debug)]
pub struct ChartRenderer {
    pipelines: ChartPipelines,
    cache: RenderCache,
    bound: BoundState,
    camera: Option<CameraUniform>,
    config: RendererConfig,
}

impl ChartRenderer {
    /// Compile the shader and create pipelines for `format`.
    pub fn new(
        ctx: &GraphicsContext,
        format: wgpu::TextureFormat,
        config: RendererConfig,
    ) -> Result<Self, RenderError> {
        profile_function!();

        if !ctx.has_feature(GpuFeatures::PUSH_CONSTANTS) {
            return Err(RenderError::MissingFeatures(GpuFeatures::PUSH_CONSTANTS));
        }
        let required = std::mem::size_of::<DrawUniforms>() as u32;
        let available = ctx.max_push_constant_size();
        if available < required {
            return Err(RenderError::PushConstantLimit {
                required,
                available,
            });
        }

        let options = PipelineOptions {
            target_format: format,
            sample_count: config.sample_count,
            wireframe: config.wireframe,
        };
        let pipelines = ChartPipelines::new(ctx, options)?;
        Ok(Self::with_pipelines(pipelines, config))
    }

    /// Use pipelines built elsewhere.
    pub fn with_pipelines(pipelines: ChartPipelines, config: RendererConfig) -> Self {
        Self {
            pipelines,
            cache: RenderCache::new(config.geometry),
            bound: BoundState::new(),
            camera: None,
            config,
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// Change geometry settings. Cached geometry is rebuilt on the next frame.
    pub fn set_geometry_config(&mut self, ctx: &dyn RenderContext, geometry: GeometryConfig) {
        self.config.geometry = geometry;
        self.cache.set_config(ctx, geometry);
    }

    /// Sync the cache and camera with `state`. Returns the viewport to draw
    /// with, or `None` when `chart` is unknown.
    pub fn prepare(
        &mut self,
        ctx: &dyn RenderContext,
        state: &ChartsState,
        chart: ChartId,
        surface_size: [u32; 2],
    ) -> Option<Viewport> {
        profile_function!();

        let series = state.series_of(chart)?;
        let viewport = state.viewport_of_chart(chart)?;

        self.cache.reconcile(ctx, series);

        let camera = CameraUniform::new(&viewport, surface_size);
        if self.camera != Some(camera) {
            ctx.write_buffer(self.pipelines.camera_buffer(), 0, bytemuck::bytes_of(&camera));
            self.camera = Some(camera);
        }

        Some(viewport)
    }

    /// Record draws for every cached series, in list order.
    ///
    /// `encoder` must be a fresh pass: the bound-state tracker is reset here.
    pub fn draw(&mut self, encoder: &mut dyn DrawEncoder, viewport: &Viewport) -> FrameStats {
        profile_function!();

        let bound = &mut self.bound;
        bound.reset();
        bound.set_camera(encoder, self.pipelines.camera_bind_group());

        for (series, handle) in self.cache.draw_items() {
            bound.set_pipeline(encoder, self.pipelines.pipeline(handle.mode));
            bound.set_vertices(encoder, &handle.vertices);

            if handle.mode == DrawMode::StrokeTriangles {
                let Some(normals) = &handle.normals else {
                    tracing::warn!(series = series.id().raw(), "stroke geometry without normals");
                    continue;
                };
                bound.set_normals(encoder, normals);
            }
            if handle.mode.is_indexed() {
                let Some(indices) = &handle.indices else {
                    tracing::warn!(series = series.id().raw(), "indexed geometry without indices");
                    continue;
                };
                bound.set_indices(encoder, indices);
            }

            bound.set_colour(encoder, series.colour().to_array());
            bound.set_offset(
                encoder,
                [(series.start_time() - viewport.min_time) as f32, 0.0],
            );

            match handle.mode {
                DrawMode::LineStrip | DrawMode::TriangleStrip => {
                    encoder.draw(0..handle.vertex_count, 0..1);
                }
                DrawMode::TriangleList | DrawMode::StrokeTriangles => {
                    encoder.draw_indexed(0..handle.draw_count, 0..1);
                }
                DrawMode::PointSprites => {
                    bound.set_point_size(encoder, series.point_size());
                    encoder.draw(0..4, 0..handle.vertex_count);
                }
            }
            bound.record_draw();
        }

        bound.stats()
    }

    /// [`prepare`](Self::prepare) then [`draw`](Self::draw).
    pub fn render(
        &mut self,
        ctx: &dyn RenderContext,
        encoder: &mut dyn DrawEncoder,
        state: &ChartsState,
        chart: ChartId,
        surface_size: [u32; 2],
    ) -> Option<FrameStats> {
        let viewport = self.prepare(ctx, state, chart, surface_size)?;
        Some(self.draw(encoder, &viewport))
    }

    /// Clear `view` and draw `chart` into it in one submitted pass.
    ///
    /// An unknown chart still clears the target.
    pub fn encode_frame(
        &mut self,
        ctx: &GraphicsContext,
        view: &wgpu::TextureView,
        resolve_target: Option<&wgpu::TextureView>,
        state: &ChartsState,
        chart: ChartId,
        surface_size: [u32; 2],
    ) -> FrameStats {
        profile_scope!("chart_encode_frame");

        let viewport = self.prepare(ctx, state, chart, surface_size);

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Chart Frame Encoder"),
            });

        let stats = {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Chart Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.config.clear_colour.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            match viewport {
                Some(viewport) => self.draw(&mut pass, &viewport),
                None => FrameStats::default(),
            }
        };

        ctx.queue.submit(std::iter::once(encoder.finish()));
        stats
    }

    /// Release every cached buffer and force a camera upload next frame.
    pub fn release(&mut self, ctx: &dyn RenderContext) {
        self.cache.clear(ctx);
        self.camera = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{DataSeries, SeriesList};
    use crate::types::AxisKey;
    use tidemark_render::{GpuBindGroup, GpuBuffer, GpuRenderPipeline};
    use tidemark_test_utils::{DrawCall, MockDrawEncoder, MockRenderContext};

    fn renderer() -> ChartRenderer {
        let pipelines = ChartPipelines::from_parts(
            [101, 102, 103, 104, 105].map(GpuRenderPipeline::mock),
            GpuBuffer::mock(110, 80),
            GpuBindGroup::mock(111),
        );
        ChartRenderer::with_pipelines(pipelines, RendererConfig::default())
    }

    fn state() -> ChartsState {
        let line = DataSeries::line(vec![0.0, 1.0, 2.0, 1.0, 0.0])
            .colour(Color::RED)
            .build()
            .unwrap();
        let dots = DataSeries::dots(vec![1.0, 1.5])
            .colour(Color::RED)
            .start_time(1.0)
            .build()
            .unwrap();
        ChartsState::new()
            .set_chart_data(ChartId(1), SeriesList::new([line, dots]))
            .unwrap()
    }

    #[test]
    fn test_render_issues_one_draw_per_series() {
        let ctx = MockRenderContext::new();
        let mut encoder = MockDrawEncoder::new();
        let mut renderer = renderer();

        let stats = renderer
            .render(&ctx, &mut encoder, &state(), ChartId(1), [640, 480])
            .unwrap();

        assert_eq!(stats.draw_calls, 2);
        assert_eq!(encoder.count_draws(), 2);
        assert_eq!(
            encoder.calls().last(),
            Some(&DrawCall::Draw {
                vertices: 0..4,
                instances: 0..2
            })
        );
        // Same colour for both series: the second colour write is skipped.
        assert!(stats.state_changes_skipped >= 1);
    }

    #[test]
    fn test_camera_written_only_when_viewport_changes() {
        let ctx = MockRenderContext::new();
        let mut renderer = renderer();
        let s0 = state();

        renderer.prepare(&ctx, &s0, ChartId(1), [640, 480]);
        renderer.prepare(&ctx, &s0, ChartId(1), [640, 480]);
        assert_eq!(ctx.count_buffer_writes(), 1);

        let s1 = s0.zoom_time_viewport(AxisKey(1), 0.5);
        renderer.prepare(&ctx, &s1, ChartId(1), [640, 480]);
        assert_eq!(ctx.count_buffer_writes(), 2);
        assert_eq!(renderer.cache().stats().geometry_builds, 2);
    }

    #[test]
    fn test_unknown_chart_draws_nothing() {
        let ctx = MockRenderContext::new();
        let mut encoder = MockDrawEncoder::new();
        let mut renderer = renderer();

        assert!(renderer
            .render(&ctx, &mut encoder, &state(), ChartId(9), [640, 480])
            .is_none());
        assert!(encoder.calls().is_empty());
        assert_eq!(ctx.call_count(), 0);
    }

    #[test]
    fn test_offset_is_relative_to_viewport() {
        let ctx = MockRenderContext::new();
        let mut encoder = MockDrawEncoder::new();
        let mut renderer = renderer();
        let s = state().set_time_viewport(
            AxisKey(1),
            crate::types::TimeRange::new(0.5, 3.0),
        );

        renderer.render(&ctx, &mut encoder, &s, ChartId(1), [640, 480]);

        let offsets = encoder
            .calls()
            .iter()
            .filter_map(|call| match call {
                DrawCall::SetPushConstants { offset: 16, data } => {
                    Some(bytemuck::pod_read_unaligned::<[f32; 2]>(data))
                }
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(offsets, vec![[-0.5, 0.0], [0.5, 0.0]]);
    }

    #[test]
    fn test_gpu_shader_error_maps_to_render_error() {
        let error = RenderError::from(GpuError::ShaderCompilation {
            label: Some("Chart Shader".into()),
            message: "oops".into(),
        });
        assert!(matches!(
            &error,
            RenderError::ShaderCompilation { label: Some(label), .. } if label == "Chart Shader"
        ));
        assert_eq!(error.to_string(), "shader Some(\"Chart Shader\") failed to compile: oops");

        let error = RenderError::from(GpuError::Validation("bad".into()));
        assert!(matches!(error, RenderError::Gpu(_)));
    }

    #[test]
    fn test_release_frees_buffers() {
        let ctx = MockRenderContext::new();
        let mut renderer = renderer();
        renderer.prepare(&ctx, &state(), ChartId(1), [640, 480]);
        assert_eq!(ctx.live_buffer_count(), 2);

        renderer.release(&ctx);
        assert_eq!(ctx.live_buffer_count(), 0);
    }
}
