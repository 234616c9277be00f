//! Mock GPU context and draw encoder that record calls instead of touching a device.

use crate::{
    draw_encoder::DrawEncoder, error::GpuError, gpu_types::*, render_context::RenderContext,
};
use ahash::AHashSet;
use parking_lot::Mutex;
use std::ops::Range;
use wgpu::*;

/// A resource operation recorded by [`MockRenderContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    CreateBuffer {
        label: Option<String>,
        size: u64,
        usage: BufferUsages,
    },
    /// A creation attempt rejected by failure injection.
    CreateBufferFailed { label: Option<String> },
    WriteBuffer {
        buffer: ResourceId,
        offset: u64,
        size: usize,
    },
    DestroyBuffer { buffer: ResourceId },
    CreateShaderModule { label: Option<String> },
    CreateBindGroupLayout { label: Option<String> },
    CreateBindGroup { label: Option<String> },
    CreateRenderPipeline { label: Option<String> },
}

#[derive(Default)]
struct FailureInjection {
    buffer_creates: usize,
    max_buffer_size: Option<u64>,
    shader_error: Option<String>,
}

/// Mock implementation of [`RenderContext`].
///
/// Records every call and hands out mock wrappers. Failures can be injected
/// to exercise retry paths.
///
/// ```rust
/// use tidemark_test_utils::{MockRenderContext, RenderContext};
/// use wgpu::BufferUsages;
///
/// let mock = MockRenderContext::new();
/// mock.fail_next_buffer_creates(1);
///
/// assert!(mock.create_buffer_init(None, &[0; 16], BufferUsages::VERTEX).is_err());
/// assert!(mock.create_buffer_init(None, &[0; 16], BufferUsages::VERTEX).is_ok());
/// assert_eq!(mock.count_buffer_creates(), 1);
/// ```
#[derive(Default)]
pub struct MockRenderContext {
    calls: Mutex<Vec<RenderCall>>,
    live_buffers: Mutex<AHashSet<ResourceId>>,
    failures: Mutex<FailureInjection>,
}

impl MockRenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` buffer creations fail with `OutOfMemory`.
    pub fn fail_next_buffer_creates(&self, count: usize) {
        self.failures.lock().buffer_creates = count;
    }

    /// Reject buffers larger than `max` bytes, like a device limit.
    pub fn set_max_buffer_size(&self, max: Option<u64>) {
        self.failures.lock().max_buffer_size = max;
    }

    /// Make every shader compilation fail with `message`.
    pub fn fail_shader_compilation(&self, message: impl Into<String>) {
        self.failures.lock().shader_error = Some(message.into());
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn count(&self, predicate: impl Fn(&RenderCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    pub fn count_buffer_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateBuffer { .. }))
    }

    pub fn count_failed_buffer_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateBufferFailed { .. }))
    }

    pub fn count_buffer_writes(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::WriteBuffer { .. }))
    }

    pub fn count_buffer_destroys(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::DestroyBuffer { .. }))
    }

    pub fn count_render_pipeline_creates(&self) -> usize {
        self.count(|call| matches!(call, RenderCall::CreateRenderPipeline { .. }))
    }

    /// Buffers created and not yet destroyed.
    pub fn live_buffer_count(&self) -> usize {
        self.live_buffers.lock().len()
    }

    pub fn is_buffer_live(&self, id: ResourceId) -> bool {
        self.live_buffers.lock().contains(&id)
    }

    fn allocate_buffer(
        &self,
        label: Option<&str>,
        size: u64,
        usage: BufferUsages,
    ) -> Result<GpuBuffer, GpuError> {
        let label = label.map(str::to_string);
        {
            let mut failures = self.failures.lock();
            if failures.buffer_creates > 0 {
                failures.buffer_creates -= 1;
                self.calls.lock().push(RenderCall::CreateBufferFailed {
                    label: label.clone(),
                });
                return Err(GpuError::OutOfMemory { label });
            }
            if let Some(max) = failures.max_buffer_size.filter(|max| size > *max) {
                self.calls.lock().push(RenderCall::CreateBufferFailed {
                    label: label.clone(),
                });
                return Err(GpuError::BufferTooLarge { label, size, max });
            }
        }

        let buffer = GpuBuffer::mock(ResourceId::next().0, size);
        self.live_buffers.lock().insert(buffer.id());
        self.calls
            .lock()
            .push(RenderCall::CreateBuffer { label, size, usage });
        Ok(buffer)
    }
}

impl RenderContext for MockRenderContext {
    fn create_buffer(&self, desc: &BufferDescriptor) -> Result<GpuBuffer, GpuError> {
        self.allocate_buffer(desc.label, desc.size, desc.usage)
    }

    fn create_buffer_init(
        &self,
        label: Option<&str>,
        contents: &[u8],
        usage: BufferUsages,
    ) -> Result<GpuBuffer, GpuError> {
        self.allocate_buffer(label, contents.len() as u64, usage)
    }

    fn write_buffer(&self, buffer: &GpuBuffer, offset: u64, data: &[u8]) {
        self.calls.lock().push(RenderCall::WriteBuffer {
            buffer: buffer.id(),
            offset,
            size: data.len(),
        });
    }

    fn destroy_buffer(&self, buffer: &GpuBuffer) {
        self.live_buffers.lock().remove(&buffer.id());
        self.calls
            .lock()
            .push(RenderCall::DestroyBuffer { buffer: buffer.id() });
    }

    fn create_shader_module(
        &self,
        desc: ShaderModuleDescriptor,
    ) -> Result<GpuShaderModule, GpuError> {
        let label = desc.label.map(str::to_string);
        if let Some(message) = self.failures.lock().shader_error.clone() {
            return Err(GpuError::ShaderCompilation { label, message });
        }
        self.calls
            .lock()
            .push(RenderCall::CreateShaderModule { label });
        Ok(GpuShaderModule::mock(ResourceId::next().0))
    }

    fn create_bind_group_layout(&self, desc: &BindGroupLayoutDescriptor) -> GpuBindGroupLayout {
        self.calls.lock().push(RenderCall::CreateBindGroupLayout {
            label: desc.label.map(str::to_string),
        });
        GpuBindGroupLayout::mock(ResourceId::next().0)
    }

    fn create_bind_group(&self, desc: &BindGroupDescriptor) -> GpuBindGroup {
        self.calls.lock().push(RenderCall::CreateBindGroup {
            label: desc.label.map(str::to_string),
        });
        GpuBindGroup::mock(ResourceId::next().0)
    }

    fn create_render_pipeline(&self, desc: &RenderPipelineDescriptor) -> GpuRenderPipeline {
        self.calls.lock().push(RenderCall::CreateRenderPipeline {
            label: desc.label.map(str::to_string),
        });
        GpuRenderPipeline::mock(ResourceId::next().0)
    }
}

/// A render pass command recorded by [`MockDrawEncoder`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    SetPipeline(ResourceId),
    SetBindGroup { index: u32, bind_group: ResourceId },
    SetVertexBuffer { slot: u32, buffer: ResourceId },
    SetIndexBuffer(ResourceId),
    SetPushConstants { offset: u32, data: Vec<u8> },
    Draw {
        vertices: Range<u32>,
        instances: Range<u32>,
    },
    DrawIndexed {
        indices: Range<u32>,
        instances: Range<u32>,
    },
}

impl DrawCall {
    /// Whether this call changes pass state rather than drawing.
    pub fn is_state_change(&self) -> bool {
        !matches!(self, DrawCall::Draw { .. } | DrawCall::DrawIndexed { .. })
    }
}

/// Records render pass commands in order.
#[derive(Debug, Default)]
pub struct MockDrawEncoder {
    calls: Vec<DrawCall>,
}

impl MockDrawEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn count_draws(&self) -> usize {
        self.calls.iter().filter(|call| !call.is_state_change()).count()
    }

    pub fn count_state_changes(&self) -> usize {
        self.calls.iter().filter(|call| call.is_state_change()).count()
    }

    pub fn count_pipeline_binds(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::SetPipeline(_)))
            .count()
    }

    pub fn count_vertex_buffer_binds(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::SetVertexBuffer { .. }))
            .count()
    }

    pub fn count_push_constant_writes(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DrawCall::SetPushConstants { .. }))
            .count()
    }
}

impl DrawEncoder for MockDrawEncoder {
    fn set_pipeline(&mut self, pipeline: &GpuRenderPipeline) {
        self.calls.push(DrawCall::SetPipeline(pipeline.id()));
    }

    fn set_bind_group(&mut self, index: u32, bind_group: &GpuBindGroup) {
        self.calls.push(DrawCall::SetBindGroup {
            index,
            bind_group: bind_group.id(),
        });
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &GpuBuffer) {
        self.calls.push(DrawCall::SetVertexBuffer {
            slot,
            buffer: buffer.id(),
        });
    }

    fn set_index_buffer(&mut self, buffer: &GpuBuffer) {
        self.calls.push(DrawCall::SetIndexBuffer(buffer.id()));
    }

    fn set_push_constants(&mut self, _stages: ShaderStages, offset: u32, data: &[u8]) {
        self.calls.push(DrawCall::SetPushConstants {
            offset,
            data: data.to_vec(),
        });
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.calls.push(DrawCall::Draw {
            vertices,
            instances,
        });
    }

    fn draw_indexed(&mut self, indices: Range<u32>, instances: Range<u32>) {
        self.calls.push(DrawCall::DrawIndexed { indices, instances });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex_desc(size: u64) -> BufferDescriptor<'static> {
        BufferDescriptor {
            label: Some("test_buffer"),
            size,
            usage: BufferUsages::VERTEX,
            mapped_at_creation: false,
        }
    }

    #[test]
    fn test_mock_buffer_creation() {
        let mock = MockRenderContext::new();
        let buffer = mock.create_buffer(&vertex_desc(1024)).unwrap();

        assert!(buffer.is_mock());
        assert_eq!(buffer.size(), 1024);
        assert_eq!(mock.count_buffer_creates(), 1);
        assert_eq!(mock.live_buffer_count(), 1);
    }

    #[test]
    fn test_mock_buffer_init_uses_content_length() {
        let mock = MockRenderContext::new();
        let buffer = mock
            .create_buffer_init(Some("init"), &[1u8; 48], BufferUsages::VERTEX)
            .unwrap();

        assert_eq!(buffer.size(), 48);
        assert_eq!(
            mock.calls()[0],
            RenderCall::CreateBuffer {
                label: Some("init".to_string()),
                size: 48,
                usage: BufferUsages::VERTEX,
            }
        );
    }

    #[test]
    fn test_mock_buffer_write_and_destroy() {
        let mock = MockRenderContext::new();
        let buffer = mock.create_buffer(&vertex_desc(256)).unwrap();

        mock.write_buffer(&buffer, 0, &[0u8; 64]);
        mock.destroy_buffer(&buffer);

        assert_eq!(mock.count_buffer_writes(), 1);
        assert_eq!(mock.count_buffer_destroys(), 1);
        assert!(!mock.is_buffer_live(buffer.id()));
        assert_eq!(mock.live_buffer_count(), 0);
    }

    #[test]
    fn test_injected_buffer_failures_run_out() {
        let mock = MockRenderContext::new();
        mock.fail_next_buffer_creates(2);

        assert!(matches!(
            mock.create_buffer(&vertex_desc(16)),
            Err(GpuError::OutOfMemory { .. })
        ));
        assert!(mock.create_buffer(&vertex_desc(16)).is_err());
        assert!(mock.create_buffer(&vertex_desc(16)).is_ok());

        assert_eq!(mock.count_failed_buffer_creates(), 2);
        assert_eq!(mock.count_buffer_creates(), 1);
    }

    #[test]
    fn test_max_buffer_size_limit() {
        let mock = MockRenderContext::new();
        mock.set_max_buffer_size(Some(100));

        let err = mock.create_buffer(&vertex_desc(101)).unwrap_err();
        assert_eq!(
            err,
            GpuError::BufferTooLarge {
                label: Some("test_buffer".to_string()),
                size: 101,
                max: 100,
            }
        );
        assert!(mock.create_buffer(&vertex_desc(100)).is_ok());
    }

    #[test]
    fn test_shader_failure() {
        let mock = MockRenderContext::new();
        mock.fail_shader_compilation("unexpected token");

        let result = mock.create_shader_module(ShaderModuleDescriptor {
            label: Some("chart"),
            source: ShaderSource::Wgsl("fn broken(".into()),
        });

        match result {
            Err(GpuError::ShaderCompilation { label, message }) => {
                assert_eq!(label.as_deref(), Some("chart"));
                assert_eq!(message, "unexpected token");
            }
            other => panic!("expected shader failure, got {other:?}"),
        }
    }

    #[test]
    fn test_clear_calls() {
        let mock = MockRenderContext::new();
        mock.create_buffer(&vertex_desc(8)).unwrap();
        assert_eq!(mock.call_count(), 1);

        mock.clear_calls();
        assert_eq!(mock.call_count(), 0);
        assert_eq!(mock.live_buffer_count(), 1);
    }

    #[test]
    fn test_draw_encoder_records_calls() {
        let mut encoder = MockDrawEncoder::new();
        let pipeline = GpuRenderPipeline::mock(1);
        let buffer = GpuBuffer::mock(2, 32);

        encoder.set_pipeline(&pipeline);
        encoder.set_vertex_buffer(0, &buffer);
        encoder.set_push_constants(ShaderStages::VERTEX, 0, &[0u8; 16]);
        encoder.draw(0..4, 0..1);

        assert_eq!(encoder.count_state_changes(), 3);
        assert_eq!(encoder.count_draws(), 1);
        assert_eq!(encoder.count_pipeline_binds(), 1);
        assert_eq!(encoder.count_vertex_buffer_binds(), 1);
        assert_eq!(encoder.count_push_constant_writes(), 1);
        assert_eq!(
            encoder.calls()[1],
            DrawCall::SetVertexBuffer {
                slot: 0,
                buffer: ResourceId(2),
            }
        );
    }
}
