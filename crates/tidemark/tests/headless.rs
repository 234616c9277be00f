//! Offscreen chart frames on a real adapter.

use tidemark::prelude::*;

const SIZE: [u32; 2] = [256, 128];
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

fn target(ctx: &GraphicsContext) -> wgpu::TextureView {
    ctx.device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Chart Target"),
            size: wgpu::Extent3d {
                width: SIZE[0],
                height: SIZE[1],
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

#[test]
#[ignore] // Requires GPU - run with: cargo test --test headless -- --ignored
fn test_frame_draws_every_kind() {
    let Ok(ctx) = GraphicsContext::new_owned_sync() else {
        return;
    };
    let mut renderer = ChartRenderer::new(&ctx, FORMAT, RendererConfig::default())
        .expect("chart pipelines should build");

    let line = DataSeries::line(vec![0.0, 1.0, 2.0, 1.0, 0.0]).build().unwrap();
    let band = DataSeries::min_max(&[2.0, 2.0], &[0.0, 0.0])
        .unwrap()
        .colour(Color::rgba(0.2, 0.4, 0.8, 0.5))
        .build()
        .unwrap();
    let dots = DataSeries::dots(vec![1.5, 0.5]).start_time(1.0).build().unwrap();
    let state = ChartsState::new()
        .set_chart_data(ChartId(1), SeriesList::new([line, band, dots]))
        .unwrap();

    let view = target(&ctx);
    let stats = renderer.encode_frame(&ctx, &view, None, &state, ChartId(1), SIZE);
    assert_eq!(stats.draw_calls, 3);

    let zoomed = state.zoom_time_viewport(AxisKey(1), 0.5);
    renderer.encode_frame(&ctx, &view, None, &zoomed, ChartId(1), SIZE);
    assert_eq!(renderer.cache().stats().geometry_builds, 3);

    renderer.release(&*ctx);
    let _ = ctx.device.poll(wgpu::PollType::Wait {
        submission_index: None,
        timeout: None,
    });
}

#[test]
#[ignore] // Requires GPU
fn test_stroke_pipeline_frame() {
    let Ok(ctx) = GraphicsContext::new_owned_sync() else {
        return;
    };
    let config = RendererConfig::default()
        .with_geometry(GeometryConfig::default().with_line_style(LineStyle::stroke()));
    let mut renderer = ChartRenderer::new(&ctx, FORMAT, config).expect("pipelines");

    let line = DataSeries::line(vec![0.0, 1.0, 0.0, 1.0]).build().unwrap();
    let state = ChartsState::new()
        .set_chart_data(ChartId(7), SeriesList::new([line]))
        .unwrap();

    let view = target(&ctx);
    let stats = renderer.encode_frame(&ctx, &view, None, &state, ChartId(7), SIZE);
    assert_eq!(stats.draw_calls, 1);
}
