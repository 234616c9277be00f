//! [`RenderContext`] for the real device.

use crate::context::GraphicsContext;
use tidemark_test_utils::{
    GpuBindGroup, GpuBindGroupLayout, GpuBuffer, GpuError, GpuRenderPipeline, GpuShaderModule,
    RenderContext,
};
use wgpu::util::DeviceExt;
use wgpu::{
    BindGroupDescriptor, BindGroupLayoutDescriptor, BufferDescriptor, BufferUsages,
    RenderPipelineDescriptor, ShaderModuleDescriptor,
};

impl GraphicsContext {
    fn check_buffer_size(&self, label: Option<&str>, size: u64) -> Result<(), GpuError> {
        let max = self.max_buffer_size();
        if size > max {
            return Err(GpuError::BufferTooLarge {
                label: label.map(str::to_string),
                size,
                max,
            });
        }
        Ok(())
    }

    /// Run a buffer allocation under error scopes so device failures come
    /// back as [`GpuError`] instead of reaching the uncaptured handler.
    fn scoped_buffer(
        &self,
        label: Option<&str>,
        create: impl FnOnce() -> wgpu::Buffer,
    ) -> Result<GpuBuffer, GpuError> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let buffer = create();
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        let label = label.map(str::to_string);
        if let Some(error) = out_of_memory {
            tracing::warn!(?label, "buffer allocation failed: {error}");
            buffer.destroy();
            return Err(GpuError::OutOfMemory { label });
        }
        if let Some(error) = validation {
            tracing::warn!(?label, "buffer creation rejected: {error}");
            buffer.destroy();
            return Err(GpuError::Validation(error.to_string()));
        }
        Ok(GpuBuffer::from_wgpu(buffer))
    }
}

impl RenderContext for GraphicsContext {
    fn create_buffer(&self, desc: &BufferDescriptor) -> Result<GpuBuffer, GpuError> {
        self.check_buffer_size(desc.label, desc.size)?;
        self.scoped_buffer(desc.label, || self.device.create_buffer(desc))
    }

    fn create_buffer_init(
        &self,
        label: Option<&str>,
        contents: &[u8],
        usage: BufferUsages,
    ) -> Result<GpuBuffer, GpuError> {
        self.check_buffer_size(label, contents.len() as u64)?;
        self.scoped_buffer(label, || {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label,
                    contents,
                    usage,
                })
        })
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        self.queue.write_buffer(buffer.as_wgpu(), offset, data);
    }

    fn destroy_buffer(&self, buffer: &GpuBuffer) {
        buffer.as_wgpu().destroy();
    }

    /// Validation errors are captured with an error scope. Waiting on the
    /// scope blocks, so this belongs in setup code only.
    fn create_shader_module(
        &self,
        desc: ShaderModuleDescriptor,
    ) -> Result<GpuShaderModule, GpuError> {
        let label = desc.label.map(str::to_string);

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(desc);
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            tracing::error!(?label, "shader compilation failed: {error}");
            return Err(GpuError::ShaderCompilation {
                label,
                message: error.to_string(),
            });
        }

        Ok(GpuShaderModule::from_wgpu(module))
    }

    fn create_bind_group_layout(&self, desc: &BindGroupLayoutDescriptor) -> GpuBindGroupLayout {
        GpuBindGroupLayout::from_wgpu(self.device.create_bind_group_layout(desc))
    }

    fn create_bind_group(&self, desc: &BindGroupDescriptor) -> GpuBindGroup {
        GpuBindGroup::from_wgpu(self.device.create_bind_group(desc))
    }

    fn create_render_pipeline(&self, desc: &RenderPipelineDescriptor) -> GpuRenderPipeline {
        GpuRenderPipeline::from_wgpu(self.device.create_render_pipeline(desc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidemark_test_utils::MockRenderContext;

    fn upload_samples(ctx: &dyn RenderContext, samples: &[f32]) -> Result<GpuBuffer, GpuError> {
        let buffer = ctx.create_buffer_init(
            Some("samples"),
            bytemuck::cast_slice(samples),
            BufferUsages::VERTEX,
        )?;
        ctx.write_buffer(&buffer, 0, bytemuck::cast_slice(&samples[..1]));
        Ok(buffer)
    }

    #[test]
    fn test_render_context_trait_object() {
        let mock = MockRenderContext::new();

        let buffer = upload_samples(&mock, &[1.0, 2.0, 3.0]).unwrap();

        assert_eq!(buffer.size(), 12);
        assert_eq!(mock.count_buffer_creates(), 1);
        assert_eq!(mock.count_buffer_writes(), 1);
    }
}
