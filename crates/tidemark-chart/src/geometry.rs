//! Conversion of data series into GPU-ready vertex and index data.
//!
//! Everything here is pure. Geometry is emitted in series-local time: the
//! first sample sits at `x = 0` and the series' `start_time` is applied per
//! draw, so panning never forces a rebuild.

use crate::series::{DataSeries, SeriesKind};
use glam::DVec2;
use tidemark_core::profiling::profile_function;

/// How the renderer must draw a [`Geometry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawMode {
    /// Connected line through the vertices.
    LineStrip,
    /// Triangle strip over the vertices in emission order.
    TriangleStrip,
    /// Indexed triangle list.
    TriangleList,
    /// Indexed triangle list whose vertices are offset by a normal buffer.
    StrokeTriangles,
    /// One screen-space marker per vertex.
    PointSprites,
}

impl DrawMode {
    pub const ALL: [DrawMode; 5] = [
        DrawMode::LineStrip,
        DrawMode::TriangleStrip,
        DrawMode::TriangleList,
        DrawMode::StrokeTriangles,
        DrawMode::PointSprites,
    ];

    pub fn is_indexed(self) -> bool {
        matches!(self, DrawMode::TriangleList | DrawMode::StrokeTriangles)
    }
}

/// Triangulation used for min/max bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BandTopology {
    /// Triangle strip, no index buffer.
    Strip,
    /// Triangle list with two triangles per quad.
    #[default]
    Indexed,
}

/// How line series are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LineStyle {
    /// One-pixel line strip.
    #[default]
    Strip,
    /// Triangulated ribbon, `half_width` data units either side of the line.
    Stroke { half_width: f32 },
}

impl LineStyle {
    pub const DEFAULT_HALF_WIDTH: f32 = 0.1;

    pub fn stroke() -> Self {
        LineStyle::Stroke {
            half_width: Self::DEFAULT_HALF_WIDTH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeometryConfig {
    pub line_style: LineStyle,
    pub band_topology: BandTopology,
}

impl GeometryConfig {
    pub fn with_line_style(mut self, style: LineStyle) -> Self {
        self.line_style = style;
        self
    }

    pub fn with_band_topology(mut self, topology: BandTopology) -> Self {
        self.band_topology = topology;
        self
    }
}

/// Vertex, normal and index data for one series.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub positions: Vec<[f32; 2]>,
    /// Per-vertex offsets, parallel to `positions`. Stroke only.
    pub normals: Option<Vec<[f32; 2]>>,
    pub indices: Option<Vec<u32>>,
    pub mode: DrawMode,
    pub vertex_count: u32,
}

impl Geometry {
    fn new(positions: Vec<[f32; 2]>, mode: DrawMode) -> Self {
        let vertex_count = positions.len() as u32;
        Self {
            positions,
            normals: None,
            indices: None,
            mode,
            vertex_count,
        }
    }

    /// Elements to draw: indices when indexed, vertices otherwise.
    pub fn draw_count(&self) -> u32 {
        match &self.indices {
            Some(indices) => indices.len() as u32,
            None => self.vertex_count,
        }
    }

    /// Nothing to draw. Degenerate input produces this instead of failing.
    pub fn is_empty(&self) -> bool {
        self.draw_count() == 0
    }
}

/// Build the geometry for `series`.
pub fn build(series: &DataSeries, config: &GeometryConfig) -> Geometry {
    profile_function!();

    let samples = series.samples();
    let spacing = series.sample_spacing();
    match series.kind() {
        SeriesKind::Line => match config.line_style {
            LineStyle::Strip => line(samples, spacing),
            LineStyle::Stroke { half_width } => stroke(samples, spacing, half_width),
        },
        SeriesKind::MinMax => band(samples, spacing, config.band_topology),
        SeriesKind::Dots => dots(samples, spacing),
    }
}

fn line_positions(samples: &[f64], spacing: f64) -> Vec<[f32; 2]> {
    samples
        .iter()
        .enumerate()
        .map(|(i, &v)| [(i as f64 * spacing) as f32, v as f32])
        .collect()
}

/// Vertex `i` at `(i * spacing, samples[i])`. Empty below two samples.
pub fn line(samples: &[f64], spacing: f64) -> Geometry {
    if samples.len() < 2 {
        return Geometry::new(Vec::new(), DrawMode::LineStrip);
    }
    Geometry::new(line_positions(samples, spacing), DrawMode::LineStrip)
}

/// Same vertices as [`line`], drawn as markers.
pub fn dots(samples: &[f64], spacing: f64) -> Geometry {
    Geometry::new(line_positions(samples, spacing), DrawMode::PointSprites)
}

/// Band over interleaved `top, bottom` pairs. Pair `i` emits
/// `(x, top)` then `(x, bottom)` with `x = i * spacing`. A trailing
/// unpaired value is ignored.
pub fn band(samples: &[f64], spacing: f64, topology: BandTopology) -> Geometry {
    let positions = samples
        .chunks_exact(2)
        .enumerate()
        .flat_map(|(i, pair)| {
            let x = (i as f64 * spacing) as f32;
            [[x, pair[0] as f32], [x, pair[1] as f32]]
        })
        .collect::<Vec<_>>();

    match topology {
        BandTopology::Strip if positions.len() < 4 => {
            Geometry::new(Vec::new(), DrawMode::TriangleStrip)
        }
        BandTopology::Strip => Geometry::new(positions, DrawMode::TriangleStrip),
        BandTopology::Indexed => {
            let mut geometry = Geometry::new(positions, DrawMode::TriangleList);
            geometry.indices = Some(quad_indices(geometry.vertex_count));
            geometry
        }
    }
}

/// Two triangles per quad over vertices laid out as successive pairs.
///
/// Quad `q` spans vertices `2q..=2q+3` and emits `(2q, 2q+1, 2q+2)` and
/// `(2q+1, 2q+2, 2q+3)`. There are `(vertex_count - 2) / 2` quads.
pub fn quad_indices(vertex_count: u32) -> Vec<u32> {
    let quads = vertex_count.saturating_sub(2) / 2;
    let mut indices = Vec::with_capacity(quads as usize * 6);
    for q in 0..quads {
        let base = 2 * q;
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 1, base + 2, base + 3]);
    }
    indices
}

/// Thick line as a ribbon of quads.
///
/// Each segment `(i-1, i)` contributes four vertices: both endpoints, each
/// once with `+normal` and once with `-normal`. The normal is the segment
/// direction rotated 90° and scaled to `half_width`. Normals live in their
/// own buffer and are added in the vertex shader. The quads that bridge
/// consecutive segments fill the joins.
pub fn stroke(samples: &[f64], spacing: f64, half_width: f32) -> Geometry {
    let segments = samples.len().saturating_sub(1);
    let mut positions = Vec::with_capacity(segments * 4);
    let mut normals = Vec::with_capacity(segments * 4);

    for i in 1..samples.len() {
        let prev = DVec2::new((i - 1) as f64 * spacing, samples[i - 1]);
        let curr = DVec2::new(i as f64 * spacing, samples[i]);
        let normal = (curr - prev).perp().normalize_or_zero() * half_width as f64;

        let p = prev.as_vec2().to_array();
        let c = curr.as_vec2().to_array();
        let n = normal.as_vec2().to_array();
        let m = (-normal).as_vec2().to_array();

        positions.extend_from_slice(&[p, p, c, c]);
        normals.extend_from_slice(&[n, m, n, m]);
    }

    let mut geometry = Geometry::new(positions, DrawMode::StrokeTriangles);
    geometry.indices = Some(quad_indices(geometry.vertex_count));
    geometry.normals = Some(normals);
    geometry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_vertices() {
        let geometry = line(&[0.0, 1.0, 2.0], 0.5);
        assert_eq!(geometry.positions, vec![[0.0, 0.0], [0.5, 1.0], [1.0, 2.0]]);
        assert_eq!(geometry.mode, DrawMode::LineStrip);
        assert_eq!(geometry.draw_count(), 3);
        assert!(geometry.indices.is_none());
    }

    #[test]
    fn test_band_strip_and_indexed() {
        let samples = [2.0, 0.0, 3.0, 1.0, 4.0, 2.0];

        let strip = band(&samples, 1.0, BandTopology::Strip);
        assert_eq!(strip.mode, DrawMode::TriangleStrip);
        assert_eq!(strip.vertex_count, 6);
        assert_eq!(strip.positions[2], [1.0, 3.0]);
        assert_eq!(strip.positions[3], [1.0, 1.0]);

        let indexed = band(&samples, 1.0, BandTopology::Indexed);
        assert_eq!(indexed.mode, DrawMode::TriangleList);
        assert_eq!(
            indexed.indices.as_deref(),
            Some(&[0, 1, 2, 1, 2, 3, 2, 3, 4, 3, 4, 5][..])
        );
        assert_eq!(indexed.draw_count(), 12);
    }

    #[test]
    fn test_quad_indices_small_counts() {
        assert!(quad_indices(0).is_empty());
        assert!(quad_indices(2).is_empty());
        assert!(quad_indices(3).is_empty());
        assert_eq!(quad_indices(4).len(), 6);
        assert_eq!(quad_indices(5).len(), 6);
    }

    #[test]
    fn test_stroke_layout() {
        let geometry = stroke(&[0.0, 0.0, 0.0], 1.0, 0.1);

        assert_eq!(geometry.vertex_count, 8);
        assert_eq!(geometry.mode, DrawMode::StrokeTriangles);
        // Three quads: two segments plus the join between them.
        assert_eq!(geometry.draw_count(), 18);

        let normals = geometry.normals.as_ref().unwrap();
        assert_eq!(normals.len(), 8);
        // Horizontal segment: normal points straight up.
        assert!((normals[0][0]).abs() < 1e-6);
        assert!((normals[0][1] - 0.1).abs() < 1e-6);
        assert!((normals[1][1] + 0.1).abs() < 1e-6);

        assert_eq!(geometry.positions[0], geometry.positions[1]);
        assert_eq!(geometry.positions[2], [1.0, 0.0]);
    }

    #[test]
    fn test_stroke_normals_are_unit_scaled() {
        let geometry = stroke(&[0.0, 3.0, -1.0], 4.0, 0.25);
        for normal in geometry.normals.unwrap() {
            let length = (normal[0] * normal[0] + normal[1] * normal[1]).sqrt();
            assert!((length - 0.25).abs() < 1e-5);
        }
    }

    #[test]
    fn test_degenerate_inputs_are_empty() {
        assert!(stroke(&[1.0], 1.0, 0.1).is_empty());
        assert!(stroke(&[], 1.0, 0.1).is_empty());
        assert!(band(&[1.0, 0.0], 1.0, BandTopology::Indexed).is_empty());
        assert!(line(&[], 1.0).is_empty());
        assert!(line(&[3.0], 1.0).is_empty());
        assert!(band(&[1.0, 0.0], 1.0, BandTopology::Strip).is_empty());
        assert!(!dots(&[1.0], 1.0).is_empty());
    }

    #[test]
    fn test_build_dispatches_on_kind_and_config() {
        let line_series = DataSeries::line(vec![1.0, 2.0]).build().unwrap();
        let band_series = DataSeries::min_max_interleaved(vec![1.0, 0.0, 1.0, 0.0])
            .unwrap()
            .build()
            .unwrap();
        let dot_series = DataSeries::dots(vec![1.0]).build().unwrap();

        let default = GeometryConfig::default();
        assert_eq!(build(&line_series, &default).mode, DrawMode::LineStrip);
        assert_eq!(build(&band_series, &default).mode, DrawMode::TriangleList);
        assert_eq!(build(&dot_series, &default).mode, DrawMode::PointSprites);

        let custom = GeometryConfig::default()
            .with_line_style(LineStyle::stroke())
            .with_band_topology(BandTopology::Strip);
        assert_eq!(build(&line_series, &custom).mode, DrawMode::StrokeTriangles);
        assert_eq!(build(&band_series, &custom).mode, DrawMode::TriangleStrip);
    }
}
