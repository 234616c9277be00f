//! Last-bound state tracking for a render pass.
//!
//! Consecutive series often share colour, offset or point size, and always
//! share the camera bind group. [`BoundState`] remembers what the pass
//! currently has bound and drops calls that would set the same thing again.
//! A new render pass starts with nothing bound, so the tracker must be
//! [`reset`](BoundState::reset) at the start of each pass.

use static_assertions::const_assert_eq;
use tidemark_render::wgpu::ShaderStages;
use tidemark_render::{DrawEncoder, GpuBindGroup, GpuBuffer, GpuRenderPipeline, ResourceId};

/// Per-draw values, laid out as the shader's push-constant block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    pub colour: [f32; 4],
    /// Series start relative to the viewport's left edge.
    pub offset: [f32; 2],
    pub point_size: f32,
    pub _padding: f32,
}

const_assert_eq!(std::mem::size_of::<DrawUniforms>(), 32);

pub const PUSH_CONSTANT_STAGES: ShaderStages = ShaderStages::VERTEX_FRAGMENT;
const COLOUR_OFFSET: u32 = 0;
const OFFSET_OFFSET: u32 = 16;
const POINT_SIZE_OFFSET: u32 = 24;

/// Counts of the pass commands one frame issued and skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub state_changes: u32,
    pub state_changes_skipped: u32,
}

/// What the current render pass has bound.
///
/// Chart pipelines share one pipeline layout, so push-constant values stay
/// valid across pipeline switches within a pass.
#[derive(Debug, Default)]
pub struct BoundState {
    pipeline: Option<ResourceId>,
    camera: Option<ResourceId>,
    vertices: Option<ResourceId>,
    normals: Option<ResourceId>,
    indices: Option<ResourceId>,
    colour: Option<[f32; 4]>,
    offset: Option<[f32; 2]>,
    point_size: Option<f32>,
    stats: FrameStats,
}

impl BoundState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything. Call when a new pass begins.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn set_pipeline(&mut self, encoder: &mut dyn DrawEncoder, pipeline: &GpuRenderPipeline) {
        if track(&mut self.stats, &mut self.pipeline, pipeline.id()) {
            encoder.set_pipeline(pipeline);
        }
    }

    pub fn set_camera(&mut self, encoder: &mut dyn DrawEncoder, bind_group: &GpuBindGroup) {
        if track(&mut self.stats, &mut self.camera, bind_group.id()) {
            encoder.set_bind_group(0, bind_group);
        }
    }

    pub fn set_vertices(&mut self, encoder: &mut dyn DrawEncoder, buffer: &GpuBuffer) {
        if track(&mut self.stats, &mut self.vertices, buffer.id()) {
            encoder.set_vertex_buffer(0, buffer);
        }
    }

    pub fn set_normals(&mut self, encoder: &mut dyn DrawEncoder, buffer: &GpuBuffer) {
        if track(&mut self.stats, &mut self.normals, buffer.id()) {
            encoder.set_vertex_buffer(1, buffer);
        }
    }

    pub fn set_indices(&mut self, encoder: &mut dyn DrawEncoder, buffer: &GpuBuffer) {
        if track(&mut self.stats, &mut self.indices, buffer.id()) {
            encoder.set_index_buffer(buffer);
        }
    }

    pub fn set_colour(&mut self, encoder: &mut dyn DrawEncoder, colour: [f32; 4]) {
        if track(&mut self.stats, &mut self.colour, colour) {
            encoder.set_push_constants(
                PUSH_CONSTANT_STAGES,
                COLOUR_OFFSET,
                bytemuck::cast_slice(&colour),
            );
        }
    }

    pub fn set_offset(&mut self, encoder: &mut dyn DrawEncoder, offset: [f32; 2]) {
        if track(&mut self.stats, &mut self.offset, offset) {
            encoder.set_push_constants(
                PUSH_CONSTANT_STAGES,
                OFFSET_OFFSET,
                bytemuck::cast_slice(&offset),
            );
        }
    }

    pub fn set_point_size(&mut self, encoder: &mut dyn DrawEncoder, size: f32) {
        if track(&mut self.stats, &mut self.point_size, size) {
            encoder.set_push_constants(
                PUSH_CONSTANT_STAGES,
                POINT_SIZE_OFFSET,
                bytemuck::bytes_of(&size),
            );
        }
    }

    pub fn record_draw(&mut self) {
        self.stats.draw_calls += 1;
    }
}

/// Store `value` in `slot` and report whether it differed.
fn track<T: PartialEq>(stats: &mut FrameStats, slot: &mut Option<T>, value: T) -> bool {
    if slot.as_ref() == Some(&value) {
        stats.state_changes_skipped += 1;
        false
    } else {
        *slot = Some(value);
        stats.state_changes += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidemark_test_utils::{DrawCall, MockDrawEncoder};

    #[test]
    fn test_field_offsets_match_push_ranges() {
        assert_eq!(std::mem::offset_of!(DrawUniforms, colour), COLOUR_OFFSET as usize);
        assert_eq!(std::mem::offset_of!(DrawUniforms, offset), OFFSET_OFFSET as usize);
        assert_eq!(
            std::mem::offset_of!(DrawUniforms, point_size),
            POINT_SIZE_OFFSET as usize
        );
    }

    #[test]
    fn test_repeated_binds_are_skipped() {
        let mut encoder = MockDrawEncoder::new();
        let mut bound = BoundState::new();
        let buffer = GpuBuffer::mock(1, 64);

        bound.set_vertices(&mut encoder, &buffer);
        bound.set_vertices(&mut encoder, &buffer);
        bound.set_colour(&mut encoder, [1.0, 0.0, 0.0, 1.0]);
        bound.set_colour(&mut encoder, [1.0, 0.0, 0.0, 1.0]);
        bound.set_colour(&mut encoder, [0.0, 1.0, 0.0, 1.0]);

        assert_eq!(encoder.count_vertex_buffer_binds(), 1);
        assert_eq!(encoder.count_push_constant_writes(), 2);
        assert_eq!(bound.stats().state_changes, 3);
        assert_eq!(bound.stats().state_changes_skipped, 2);
    }

    #[test]
    fn test_push_constant_slices() {
        let mut encoder = MockDrawEncoder::new();
        let mut bound = BoundState::new();

        bound.set_offset(&mut encoder, [2.0, 0.0]);
        bound.set_point_size(&mut encoder, 5.0);

        assert_eq!(
            encoder.calls()[0],
            DrawCall::SetPushConstants {
                offset: 16,
                data: bytemuck::cast_slice(&[2.0f32, 0.0]).to_vec(),
            }
        );
        assert_eq!(
            encoder.calls()[1],
            DrawCall::SetPushConstants {
                offset: 24,
                data: 5.0f32.to_ne_bytes().to_vec(),
            }
        );
    }

    #[test]
    fn test_reset_forgets_bindings() {
        let mut encoder = MockDrawEncoder::new();
        let mut bound = BoundState::new();
        let pipeline = GpuRenderPipeline::mock(3);

        bound.set_pipeline(&mut encoder, &pipeline);
        bound.reset();
        bound.set_pipeline(&mut encoder, &pipeline);

        assert_eq!(encoder.count_pipeline_binds(), 2);
        assert_eq!(bound.stats().state_changes, 1);
    }
}
