//! Shader, camera uniform and the render pipelines for each [`DrawMode`].

use crate::draw_state::{DrawUniforms, PUSH_CONSTANT_STAGES};
use crate::geometry::DrawMode;
use crate::types::Viewport;
use glam::Mat4;
use static_assertions::const_assert_eq;
use tidemark_render::wgpu;
use tidemark_render::{
    GpuBindGroup, GpuBuffer, GpuError, GpuFeatures, GpuRenderPipeline, GpuShaderModule,
    GraphicsContext, RenderContext,
};

/// All chart draws go through this module. Geometry arrives in series-local
/// time; `draw.offset` moves it to viewport-relative time before projection.
const CHART_SHADER: &str = r#"
struct Camera {
    projection: mat4x4<f32>,
    viewport_px: vec2<f32>,
    _padding: vec2<f32>,
}

struct Draw {
    colour: vec4<f32>,
    offset: vec2<f32>,
    point_size: f32,
    _padding: f32,
}

@group(0) @binding(0)
var<uniform> camera: Camera;

var<push_constant> draw: Draw;

fn project(position: vec2<f32>) -> vec4<f32> {
    return camera.projection * vec4<f32>(position + draw.offset, 0.0, 1.0);
}

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
}

@vertex
fn vs_main(@location(0) position: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip = project(position);
    return out;
}

@vertex
fn vs_stroke(@location(0) position: vec2<f32>, @location(1) normal: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip = project(position + normal);
    return out;
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return draw.colour;
}

struct DotOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) local: vec2<f32>,
}

// One instance per sample, four strip vertices per instance.
@vertex
fn vs_dot(@builtin(vertex_index) corner_index: u32, @location(0) center: vec2<f32>) -> DotOutput {
    let corner = vec2<f32>(f32(corner_index & 1u), f32((corner_index >> 1u) & 1u)) - vec2<f32>(0.5);
    var clip = project(center);
    let pixel_to_clip = 2.0 / camera.viewport_px;
    clip = vec4<f32>(clip.xy + corner * draw.point_size * pixel_to_clip * clip.w, clip.zw);

    var out: DotOutput;
    out.clip = clip;
    out.local = corner;
    return out;
}

@fragment
fn fs_dot(in: DotOutput) -> @location(0) vec4<f32> {
    if length(in.local) > 0.5 {
        discard;
    }
    return draw.colour;
}
"#;

/// Camera block at group 0, binding 0.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub projection: [[f32; 4]; 4],
    pub viewport_px: [f32; 2],
    pub _padding: [f32; 2],
}

const_assert_eq!(std::mem::size_of::<CameraUniform>(), 80);

impl CameraUniform {
    /// Orthographic projection of `viewport` onto the surface.
    ///
    /// The time axis is projected relative to `viewport.min_time`, which
    /// keeps large absolute timestamps out of `f32` vertex math.
    pub fn new(viewport: &Viewport, surface_size: [u32; 2]) -> Self {
        let width = (viewport.max_time - viewport.min_time) as f32;
        let projection = Mat4::orthographic_rh(
            0.0,
            width,
            viewport.min_value as f32,
            viewport.max_value as f32,
            -1.0,
            1.0,
        );
        Self {
            projection: projection.to_cols_array_2d(),
            viewport_px: [surface_size[0].max(1) as f32, surface_size[1].max(1) as f32],
            _padding: [0.0; 2],
        }
    }
}

/// Settings fixed at pipeline creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub target_format: wgpu::TextureFormat,
    pub sample_count: u32,
    /// Draw triangle pipelines as outlines. Needs `POLYGON_MODE_LINE`.
    pub wireframe: bool,
}

impl PipelineOptions {
    pub fn new(target_format: wgpu::TextureFormat) -> Self {
        Self {
            target_format,
            sample_count: 1,
            wireframe: false,
        }
    }
}

/// Compile the chart shader, surfacing validation errors.
pub fn compile_chart_shader(ctx: &dyn RenderContext) -> Result<GpuShaderModule, GpuError> {
    ctx.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Chart Shader"),
        source: wgpu::ShaderSource::Wgsl(CHART_SHADER.into()),
    })
}

/// One pipeline per [`DrawMode`] plus the camera they all read.
#[derive(Debug)]
pub struct ChartPipelines {
    line_strip: GpuRenderPipeline,
    triangle_strip: GpuRenderPipeline,
    triangle_list: GpuRenderPipeline,
    stroke: GpuRenderPipeline,
    dots: GpuRenderPipeline,
    camera_buffer: GpuBuffer,
    camera_bind_group: GpuBindGroup,
}

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
const NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x2];
const VERTEX_STRIDE: wgpu::BufferAddress = std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress;

impl ChartPipelines {
    /// Build every pipeline on the real device.
    pub fn new(ctx: &GraphicsContext, options: PipelineOptions) -> Result<Self, GpuError> {
        let shader = compile_chart_shader(ctx)?;
        let wireframe = options.wireframe && ctx.has_feature(GpuFeatures::POLYGON_MODE_LINE);
        if options.wireframe && !wireframe {
            tracing::warn!("wireframe requested without POLYGON_MODE_LINE, drawing filled");
        }

        let camera_layout = ctx.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Chart Camera Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let camera_buffer = ctx.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Chart Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })?;

        let camera_bind_group = ctx.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Chart Camera Bind Group"),
            layout: camera_layout.as_wgpu(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_wgpu().as_entire_binding(),
            }],
        });

        let layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Chart Pipeline Layout"),
                bind_group_layouts: &[camera_layout.as_wgpu()],
                push_constant_ranges: &[wgpu::PushConstantRange {
                    stages: PUSH_CONSTANT_STAGES,
                    range: 0..std::mem::size_of::<DrawUniforms>() as u32,
                }],
            });

        let builder = PipelineBuilder {
            ctx,
            shader: &shader,
            layout: &layout,
            options,
            wireframe,
        };

        let positions = wgpu::VertexBufferLayout {
            array_stride: VERTEX_STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &POSITION_ATTRIBUTES,
        };
        let normals = wgpu::VertexBufferLayout {
            array_stride: VERTEX_STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &NORMAL_ATTRIBUTES,
        };
        let instances = wgpu::VertexBufferLayout {
            array_stride: VERTEX_STRIDE,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &POSITION_ATTRIBUTES,
        };

        let pipelines = Self {
            line_strip: builder.build(
                "Chart Line Pipeline",
                ("vs_main", "fs_main"),
                &[positions.clone()],
                wgpu::PrimitiveTopology::LineStrip,
            ),
            triangle_strip: builder.build(
                "Chart Band Strip Pipeline",
                ("vs_main", "fs_main"),
                &[positions.clone()],
                wgpu::PrimitiveTopology::TriangleStrip,
            ),
            triangle_list: builder.build(
                "Chart Band Pipeline",
                ("vs_main", "fs_main"),
                &[positions.clone()],
                wgpu::PrimitiveTopology::TriangleList,
            ),
            stroke: builder.build(
                "Chart Stroke Pipeline",
                ("vs_stroke", "fs_main"),
                &[positions, normals],
                wgpu::PrimitiveTopology::TriangleList,
            ),
            dots: builder.build(
                "Chart Dot Pipeline",
                ("vs_dot", "fs_dot"),
                &[instances],
                wgpu::PrimitiveTopology::TriangleStrip,
            ),
            camera_buffer,
            camera_bind_group,
        };

        tracing::info!(format = ?options.target_format, wireframe, "created chart pipelines");
        Ok(pipelines)
    }

    /// Assemble from existing handles, e.g. mocks in tests.
    pub fn from_parts(
        pipelines: [GpuRenderPipeline; 5],
        camera_buffer: GpuBuffer,
        camera_bind_group: GpuBindGroup,
    ) -> Self {
        let [line_strip, triangle_strip, triangle_list, stroke, dots] = pipelines;
        Self {
            line_strip,
            triangle_strip,
            triangle_list,
            stroke,
            dots,
            camera_buffer,
            camera_bind_group,
        }
    }

    /// Pipeline for `mode`, in the order of [`DrawMode::ALL`].
    pub fn pipeline(&self, mode: DrawMode) -> &GpuRenderPipeline {
        match mode {
            DrawMode::LineStrip => &self.line_strip,
            DrawMode::TriangleStrip => &self.triangle_strip,
            DrawMode::TriangleList => &self.triangle_list,
            DrawMode::StrokeTriangles => &self.stroke,
            DrawMode::PointSprites => &self.dots,
        }
    }

    pub fn camera_buffer(&self) -> &GpuBuffer {
        &self.camera_buffer
    }

    pub fn camera_bind_group(&self) -> &GpuBindGroup {
        &self.camera_bind_group
    }
}

struct PipelineBuilder<'a> {
    ctx: &'a GraphicsContext,
    shader: &'a GpuShaderModule,
    layout: &'a wgpu::PipelineLayout,
    options: PipelineOptions,
    wireframe: bool,
}

impl PipelineBuilder<'_> {
    fn build(
        &self,
        label: &str,
        (vertex_entry, fragment_entry): (&str, &str),
        buffers: &[wgpu::VertexBufferLayout],
        topology: wgpu::PrimitiveTopology,
    ) -> GpuRenderPipeline {
        let polygon_mode = if self.wireframe && !matches!(topology, wgpu::PrimitiveTopology::LineStrip) {
            wgpu::PolygonMode::Line
        } else {
            wgpu::PolygonMode::Fill
        };

        self.ctx
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(self.layout),
                vertex: wgpu::VertexState {
                    module: self.shader.as_wgpu(),
                    entry_point: Some(vertex_entry),
                    buffers,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: self.shader.as_wgpu(),
                    entry_point: Some(fragment_entry),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.options.target_format,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    cull_mode: None,
                    polygon_mode,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: self.options.sample_count,
                    ..Default::default()
                },
                multiview: None,
                cache: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidemark_test_utils::MockRenderContext;

    #[test]
    fn test_camera_maps_viewport_corners() {
        let viewport = Viewport {
            min_time: 1_000_000.0,
            max_time: 1_000_010.0,
            min_value: -2.0,
            max_value: 2.0,
        };
        let camera = CameraUniform::new(&viewport, [800, 600]);
        let projection = Mat4::from_cols_array_2d(&camera.projection);

        let left_bottom = projection.project_point3(glam::Vec3::new(0.0, -2.0, 0.0));
        let right_top = projection.project_point3(glam::Vec3::new(10.0, 2.0, 0.0));

        assert!((left_bottom.x + 1.0).abs() < 1e-6);
        assert!((left_bottom.y + 1.0).abs() < 1e-6);
        assert!((right_top.x - 1.0).abs() < 1e-6);
        assert!((right_top.y - 1.0).abs() < 1e-6);
        assert!((0.0..=1.0).contains(&left_bottom.z));
        assert_eq!(camera.viewport_px, [800.0, 600.0]);
    }

    #[test]
    fn test_zero_surface_size_is_clamped() {
        let viewport = Viewport {
            min_time: 0.0,
            max_time: 1.0,
            min_value: 0.0,
            max_value: 1.0,
        };
        assert_eq!(CameraUniform::new(&viewport, [0, 0]).viewport_px, [1.0, 1.0]);
    }

    #[test]
    fn test_shader_failure_is_reported() {
        let ctx = MockRenderContext::new();
        ctx.fail_shader_compilation("bad push constant block");

        let err = compile_chart_shader(&ctx).unwrap_err();
        assert!(matches!(err, GpuError::ShaderCompilation { .. }));
    }

    #[test]
    fn test_shader_declares_every_entry_point() {
        for entry in ["vs_main", "vs_stroke", "vs_dot", "fs_main", "fs_dot"] {
            assert!(CHART_SHADER.contains(&format!("fn {entry}(")), "missing {entry}");
        }
    }

    #[test]
    fn test_from_parts_maps_modes() {
        let pipelines = ChartPipelines::from_parts(
            [1, 2, 3, 4, 5].map(GpuRenderPipeline::mock),
            GpuBuffer::mock(6, 80),
            GpuBindGroup::mock(7),
        );

        let ids = DrawMode::ALL.map(|mode| pipelines.pipeline(mode).id().0);
        assert_eq!(ids, [1, 2, 3, 4, 5]);
    }
}
