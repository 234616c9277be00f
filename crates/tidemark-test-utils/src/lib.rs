//! GPU abstraction layer for tidemark.
//!
//! Chart code never talks to `wgpu::Device` or `wgpu::RenderPass` directly.
//! Resource creation goes through [`RenderContext`] and draw recording goes
//! through [`DrawEncoder`], so the render cache and the renderer's draw loop
//! can run against a mock in tests.
//!
//! # Overview
//!
//! - [`RenderContext`] - buffer, shader, bind group and pipeline creation
//! - [`DrawEncoder`] - the subset of render pass commands the charts issue
//! - GPU wrapper types ([`GpuBuffer`], [`GpuRenderPipeline`], ...) - real or mock
//! - `MockRenderContext` / `MockDrawEncoder` - call recorders (requires `mock` feature)
//!
//! # Example
//!
//! ```rust
//! # #[cfg(feature = "mock")]
//! # {
//! use tidemark_test_utils::{MockRenderContext, RenderContext};
//! use wgpu::{BufferDescriptor, BufferUsages};
//!
//! let mock = MockRenderContext::new();
//! let buffer = mock
//!     .create_buffer(&BufferDescriptor {
//!         label: Some("samples"),
//!         size: 1024,
//!         usage: BufferUsages::VERTEX,
//!         mapped_at_creation: false,
//!     })
//!     .unwrap();
//!
//! assert_eq!(mock.count_buffer_creates(), 1);
//! assert!(buffer.is_mock());
//! # }
//! ```
//!
//! Wrapper types are owned and cheap to clone, so no lifetimes leak from the
//! device into chart code. Mocks use interior mutability (`parking_lot::Mutex`)
//! so the `&self` methods of [`RenderContext`] can record calls.

pub mod draw_encoder;
pub mod error;
pub mod gpu_types;
#[cfg(feature = "mock")]
pub mod mock_render;
pub mod render_context;

pub use draw_encoder::*;
pub use error::GpuError;
pub use gpu_types::*;
#[cfg(feature = "mock")]
pub use mock_render::*;
pub use render_context::*;
