//! wgpu plumbing for tidemark: the shared [`GraphicsContext`], its
//! [`RenderContext`] implementation and the [`Color`] type used by series.

mod color;
mod context;
mod context_impl;
mod features;

pub use color::Color;
pub use context::{ContextError, GraphicsContext, GraphicsContextDescriptor};
pub use features::{FeatureSupportResult, GpuFeatures};

pub use tidemark_test_utils::{
    DrawEncoder, GpuBindGroup, GpuBindGroupLayout, GpuBuffer, GpuError, GpuRenderPipeline,
    GpuShaderModule, RenderContext, ResourceId,
};

pub use wgpu;
