//! Render pass command abstraction.

use crate::gpu_types::{GpuBindGroup, GpuBuffer, GpuRenderPipeline};
use std::ops::Range;

/// The render pass commands chart drawing issues.
///
/// Implemented for `wgpu::RenderPass` and, with the `mock` feature, for
/// `MockDrawEncoder`, which records each command so tests can count state
/// changes.
pub trait DrawEncoder {
    fn set_pipeline(&mut self, pipeline: &GpuRenderPipeline);

    fn set_bind_group(&mut self, index: u32, bind_group: &GpuBindGroup);

    /// Bind the whole of `buffer` to a vertex slot.
    fn set_vertex_buffer(&mut self, slot: u32, buffer: &GpuBuffer);

    /// Bind the whole of `buffer` as a `u32` index buffer.
    fn set_index_buffer(&mut self, buffer: &GpuBuffer);

    fn set_push_constants(&mut self, stages: wgpu::ShaderStages, offset: u32, data: &[u8]);

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>);

    fn draw_indexed(&mut self, indices: Range<u32>, instances: Range<u32>);
}

impl DrawEncoder for wgpu::RenderPass<'_> {
    fn set_pipeline(&mut self, pipeline: &GpuRenderPipeline) {
        wgpu::RenderPass::set_pipeline(self, pipeline.as_wgpu());
    }

    fn set_bind_group(&mut self, index: u32, bind_group: &GpuBindGroup) {
        wgpu::RenderPass::set_bind_group(self, index, bind_group.as_wgpu(), &[]);
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &GpuBuffer) {
        wgpu::RenderPass::set_vertex_buffer(self, slot, buffer.as_wgpu().slice(..));
    }

    fn set_index_buffer(&mut self, buffer: &GpuBuffer) {
        wgpu::RenderPass::set_index_buffer(
            self,
            buffer.as_wgpu().slice(..),
            wgpu::IndexFormat::Uint32,
        );
    }

    fn set_push_constants(&mut self, stages: wgpu::ShaderStages, offset: u32, data: &[u8]) {
        wgpu::RenderPass::set_push_constants(self, stages, offset, data);
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        wgpu::RenderPass::draw(self, vertices, instances);
    }

    fn draw_indexed(&mut self, indices: Range<u32>, instances: Range<u32>) {
        wgpu::RenderPass::draw_indexed(self, indices, 0, instances);
    }
}
