//! Trait abstracting GPU resource creation.

use crate::{error::GpuError, gpu_types::*};
use wgpu::{
    BindGroupDescriptor, BindGroupLayoutDescriptor, BufferDescriptor, BufferUsages,
    RenderPipelineDescriptor, ShaderModuleDescriptor,
};

/// GPU resource creation and upload.
///
/// Methods take `&self` and return owned wrappers, so the trait is object
/// safe and a single context can be shared through an `Arc`. Creation of
/// buffers and shader modules is fallible; callers decide whether a failure
/// is fatal (shaders at renderer construction) or retried (series buffers).
///
/// ```rust,no_run
/// use tidemark_test_utils::{GpuError, RenderContext};
/// use wgpu::BufferUsages;
///
/// fn upload(ctx: &dyn RenderContext, samples: &[f32]) -> Result<(), GpuError> {
///     let bytes: Vec<u8> = samples.iter().flat_map(|v| v.to_le_bytes()).collect();
///     let buffer = ctx.create_buffer_init(Some("samples"), &bytes, BufferUsages::VERTEX)?;
///     ctx.destroy_buffer(&buffer);
///     Ok(())
/// }
/// ```
pub trait RenderContext: Send + Sync {
    /// Create an uninitialized buffer.
    fn create_buffer(&self, desc: &BufferDescriptor) -> Result<GpuBuffer, GpuError>;

    /// Create a buffer holding `contents`.
    fn create_buffer_init(
        &self,
        label: Option<&str>,
        contents: &[u8],
        usage: BufferUsages,
    ) -> Result<GpuBuffer, GpuError>;

    /// Queue a write into an existing buffer.
    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]);

    /// Release the buffer's GPU memory now instead of on last drop.
    fn destroy_buffer(&self, buffer: &GpuBuffer);

    /// Compile a shader module, reporting parse and validation errors.
    fn create_shader_module(
        &self,
        desc: ShaderModuleDescriptor,
    ) -> Result<GpuShaderModule, GpuError>;

    fn create_bind_group_layout(&self, desc: &BindGroupLayoutDescriptor) -> GpuBindGroupLayout;

    fn create_bind_group(&self, desc: &BindGroupDescriptor) -> GpuBindGroup;

    fn create_render_pipeline(&self, desc: &RenderPipelineDescriptor) -> GpuRenderPipeline;
}
