//! Graphics context creation against a real adapter.

use std::sync::Arc;
use tidemark_render::{GpuFeatures, GraphicsContext, GraphicsContextDescriptor, RenderContext};

#[test]
#[ignore] // Requires GPU - run with: cargo test --test context_tests -- --ignored
fn test_context_creation_sync() {
    match GraphicsContext::new_owned_sync() {
        Ok(ctx) => {
            assert_eq!(Arc::strong_count(&ctx), 1);
            assert!(ctx.has_feature(GpuFeatures::PUSH_CONSTANTS));
            assert!(ctx.max_push_constant_size() >= 32);
        }
        Err(e) => println!("GPU not available: {e}"),
    }
}

#[test]
#[ignore] // Requires GPU
fn test_oversized_buffer_is_rejected() {
    let Ok(ctx) = GraphicsContext::new_owned_sync() else {
        return;
    };

    let result = ctx.create_buffer(&wgpu::BufferDescriptor {
        label: Some("too big"),
        size: ctx.max_buffer_size() + 4,
        usage: wgpu::BufferUsages::VERTEX,
        mapped_at_creation: false,
    });
    assert!(result.is_err());
}

#[test]
#[ignore] // Requires GPU
fn test_invalid_buffer_usage_is_an_error_not_a_panic() {
    let Ok(ctx) = GraphicsContext::new_owned_sync() else {
        return;
    };

    // MAP_READ may only be paired with COPY_DST.
    let result = ctx.create_buffer(&wgpu::BufferDescriptor {
        label: Some("mappable vertices"),
        size: 16,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::VERTEX,
        mapped_at_creation: false,
    });
    assert!(matches!(result, Err(tidemark_render::GpuError::Validation(_))));

    let ok = ctx.create_buffer_init(Some("vertices"), &[0u8; 16], wgpu::BufferUsages::VERTEX);
    assert!(ok.is_ok());
}

#[test]
#[ignore] // Requires GPU
fn test_optional_wireframe_feature() {
    let desc = GraphicsContextDescriptor::default()
        .with_requested_features(GpuFeatures::POLYGON_MODE_LINE);
    if let Ok(ctx) = pollster::block_on(GraphicsContext::new_owned_with_descriptor(desc)) {
        assert!(ctx.has_feature(GpuFeatures::PUSH_CONSTANTS));
    }
}
