//! Render cache and renderer behaviour against the mock GPU.

use std::sync::Arc;
use tidemark_chart::*;
use tidemark_render::{Color, GpuBindGroup, GpuBuffer, GpuRenderPipeline};
use tidemark_test_utils::{DrawCall, MockDrawEncoder, MockRenderContext};

fn line(samples: &[f64]) -> Arc<DataSeries> {
    DataSeries::line(samples.to_vec()).build().unwrap()
}

fn mock_renderer(config: RendererConfig) -> ChartRenderer {
    let pipelines = ChartPipelines::from_parts(
        [1, 2, 3, 4, 5].map(GpuRenderPipeline::mock),
        GpuBuffer::mock(10, 80),
        GpuBindGroup::mock(11),
    );
    ChartRenderer::with_pipelines(pipelines, config)
}

// ====================
// Cache
// ====================

#[test]
fn test_second_reconcile_touches_nothing() {
    let ctx = MockRenderContext::new();
    let mut cache = RenderCache::default();
    let list = SeriesList::new([line(&[1.0, 2.0, 3.0]), line(&[4.0, 5.0])]);

    cache.reconcile(&ctx, &list);
    let creates = ctx.count_buffer_creates();
    let destroys = ctx.count_buffer_destroys();

    assert!(!cache.reconcile(&ctx, &list));
    assert_eq!(ctx.count_buffer_creates(), creates);
    assert_eq!(ctx.count_buffer_destroys(), destroys);
}

#[test]
fn test_failed_upload_is_retried_with_same_list() {
    let ctx = MockRenderContext::new();
    let mut cache = RenderCache::default();
    let a = line(&[1.0, 2.0]);
    let b = line(&[3.0, 4.0]);
    let list = SeriesList::new([a.clone(), b.clone()]);

    ctx.fail_next_buffer_creates(1);
    assert!(cache.reconcile(&ctx, &list));
    assert_eq!(cache.pending(), 1);
    assert_eq!(cache.draw_items().count(), 1);

    assert!(cache.reconcile(&ctx, &list));
    assert_eq!(cache.pending(), 0);
    assert!(cache.contains(a.id()) && cache.contains(b.id()));
    assert_eq!(cache.stats().upload_failures, 1);

    // Now in sync.
    assert!(!cache.reconcile(&ctx, &list));
}

#[test]
fn test_failed_series_dropped_from_list_is_forgotten() {
    let ctx = MockRenderContext::new();
    let mut cache = RenderCache::default();
    let a = line(&[1.0, 2.0]);
    let b = line(&[3.0, 4.0]);

    // Two samples fit in 16 bytes, three do not.
    ctx.set_max_buffer_size(Some(16));
    cache.reconcile(&ctx, &SeriesList::new([a.clone(), line(&[1.0, 2.0, 3.0]), b.clone()]));
    assert_eq!(cache.pending(), 1);

    ctx.set_max_buffer_size(None);
    let creates = ctx.count_buffer_creates();
    cache.reconcile(&ctx, &SeriesList::new([a.clone(), b.clone()]));
    assert_eq!(cache.pending(), 0);
    assert_eq!(cache.len(), 2);
    assert_eq!(ctx.count_buffer_creates(), creates);
}

#[test]
fn test_swapping_one_series_rebuilds_only_it() {
    let ctx = MockRenderContext::new();
    let mut cache = RenderCache::default();
    let keep = line(&[1.0, 2.0]);
    let old = line(&[3.0, 4.0]);
    let new = line(&[5.0, 6.0]);

    let first = SeriesList::new([keep.clone(), old.clone()]);
    cache.reconcile(&ctx, &first);
    let second = first.replacing(old.id(), new.clone());
    cache.reconcile(&ctx, &second);

    assert_eq!(cache.stats().geometry_builds, 3);
    assert_eq!(cache.stats().buffers_released, 1);
    assert!(cache.contains(new.id()));
    assert!(!cache.contains(old.id()));
}

// ====================
// Renderer
// ====================

#[test]
fn test_viewport_change_builds_no_geometry() {
    let ctx = MockRenderContext::new();
    let mut renderer = mock_renderer(RendererConfig::default());
    let state = ChartsState::new()
        .set_chart_data(ChartId(1), SeriesList::new([line(&[0.0, 1.0, 2.0, 1.0, 0.0])]))
        .unwrap();

    renderer.prepare(&ctx, &state, ChartId(1), [100, 100]);
    let builds = renderer.cache().stats().geometry_builds;
    let creates = ctx.count_buffer_creates();

    let panned = state
        .pan_time_viewport(AxisKey(1), 1.0)
        .zoom_value_viewport(AxisKey(1), 2.0);
    renderer.prepare(&ctx, &panned, ChartId(1), [100, 100]);

    assert_eq!(renderer.cache().stats().geometry_builds, builds);
    assert_eq!(ctx.count_buffer_creates(), creates);
}

#[test]
fn test_shared_state_skipped_across_series() {
    let ctx = MockRenderContext::new();
    let mut encoder = MockDrawEncoder::new();
    let mut renderer = mock_renderer(RendererConfig::default());
    let series = (0..4).map(|i| {
        DataSeries::line(vec![0.0, i as f64])
            .colour(Color::BLUE)
            .build()
            .unwrap()
    });
    let state = ChartsState::new()
        .set_chart_data(ChartId(1), series.collect())
        .unwrap();

    let stats = renderer
        .render(&ctx, &mut encoder, &state, ChartId(1), [100, 100])
        .unwrap();

    assert_eq!(stats.draw_calls, 4);
    // One pipeline, one colour, one offset for the whole frame.
    assert_eq!(encoder.count_pipeline_binds(), 1);
    assert_eq!(encoder.count_push_constant_writes(), 2);
    assert_eq!(encoder.count_vertex_buffer_binds(), 4);
    assert_eq!(stats.state_changes_skipped, 9);
}

#[test]
fn test_each_pass_rebinds_from_scratch() {
    let ctx = MockRenderContext::new();
    let mut renderer = mock_renderer(RendererConfig::default());
    let state = ChartsState::new()
        .set_chart_data(ChartId(1), SeriesList::new([line(&[1.0, 2.0])]))
        .unwrap();

    let mut first = MockDrawEncoder::new();
    let mut second = MockDrawEncoder::new();
    renderer.render(&ctx, &mut first, &state, ChartId(1), [100, 100]);
    renderer.render(&ctx, &mut second, &state, ChartId(1), [100, 100]);

    assert_eq!(first.calls(), second.calls());
}

#[test]
fn test_draw_call_order_for_mixed_kinds() {
    let ctx = MockRenderContext::new();
    let mut encoder = MockDrawEncoder::new();
    let mut renderer = mock_renderer(
        RendererConfig::default()
            .with_geometry(GeometryConfig::default().with_line_style(LineStyle::stroke())),
    );
    let stroke = line(&[0.0, 1.0, 0.0]);
    let band = DataSeries::min_max(&[2.0, 2.0], &[0.0, 0.0])
        .unwrap()
        .build()
        .unwrap();
    let dots = DataSeries::dots(vec![1.0]).point_size(6.0).build().unwrap();
    let state = ChartsState::new()
        .set_chart_data(ChartId(1), SeriesList::new([stroke, band, dots]))
        .unwrap();

    renderer.render(&ctx, &mut encoder, &state, ChartId(1), [100, 100]);

    let draws = encoder
        .calls()
        .iter()
        .filter(|call| !call.is_state_change())
        .cloned()
        .collect::<Vec<_>>();
    assert_eq!(
        draws,
        vec![
            DrawCall::DrawIndexed {
                indices: 0..18,
                instances: 0..1
            },
            DrawCall::DrawIndexed {
                indices: 0..6,
                instances: 0..1
            },
            DrawCall::Draw {
                vertices: 0..4,
                instances: 0..1
            },
        ]
    );
    assert!(encoder.calls().contains(&DrawCall::SetVertexBuffer {
        slot: 1,
        buffer: renderer
            .cache()
            .draw_items()
            .next()
            .and_then(|(_, handle)| handle.normals.as_ref())
            .map(|normals| normals.id())
            .unwrap(),
    }));
}
