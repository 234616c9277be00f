//! GPU geometry cache keyed by series identity.
//!
//! The cache keeps one [`GeometryHandle`] per [`SeriesId`] in the current
//! list. Reconciling against a new list releases the handles of series that
//! left, builds and uploads series that arrived, and leaves the rest alone:
//! a viewport change never rebuilds geometry.

use crate::geometry::{self, DrawMode, Geometry, GeometryConfig};
use crate::series::{DataSeries, ListId, SeriesId, SeriesList};
use ahash::{AHashMap, AHashSet};
use std::sync::Arc;
use tidemark_core::profiling::profile_scope;
use tidemark_render::wgpu::BufferUsages;
use tidemark_render::{GpuBuffer, GpuError, RenderContext};

/// Uploaded buffers for one series.
#[derive(Debug)]
pub struct GeometryHandle {
    pub vertices: GpuBuffer,
    pub normals: Option<GpuBuffer>,
    pub indices: Option<GpuBuffer>,
    pub mode: DrawMode,
    pub vertex_count: u32,
    /// Indices when indexed, vertices otherwise.
    pub draw_count: u32,
}

impl GeometryHandle {
    /// Upload `geometry`. Buffers created before a failure are released.
    pub fn upload(
        ctx: &dyn RenderContext,
        id: SeriesId,
        geometry: &Geometry,
    ) -> Result<Self, GpuError> {
        let vertex_label = format!("Chart Series {} Vertices", id.raw());
        let vertices = ctx.create_buffer_init(
            Some(&vertex_label),
            bytemuck::cast_slice(&geometry.positions),
            BufferUsages::VERTEX,
        )?;

        let normals = match &geometry.normals {
            Some(normals) => {
                let label = format!("Chart Series {} Normals", id.raw());
                match ctx.create_buffer_init(
                    Some(&label),
                    bytemuck::cast_slice(normals),
                    BufferUsages::VERTEX,
                ) {
                    Ok(buffer) => Some(buffer),
                    Err(e) => {
                        ctx.destroy_buffer(&vertices);
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        let indices = match &geometry.indices {
            Some(indices) => {
                let label = format!("Chart Series {} Indices", id.raw());
                match ctx.create_buffer_init(
                    Some(&label),
                    bytemuck::cast_slice(indices),
                    BufferUsages::INDEX,
                ) {
                    Ok(buffer) => Some(buffer),
                    Err(e) => {
                        ctx.destroy_buffer(&vertices);
                        if let Some(normals) = &normals {
                            ctx.destroy_buffer(normals);
                        }
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        Ok(Self {
            vertices,
            normals,
            indices,
            mode: geometry.mode,
            vertex_count: geometry.vertex_count,
            draw_count: geometry.draw_count(),
        })
    }

    fn buffer_count(&self) -> u64 {
        1 + self.normals.is_some() as u64 + self.indices.is_some() as u64
    }

    fn release(&self, ctx: &dyn RenderContext) {
        ctx.destroy_buffer(&self.vertices);
        if let Some(normals) = &self.normals {
            ctx.destroy_buffer(normals);
        }
        if let Some(indices) = &self.indices {
            ctx.destroy_buffer(indices);
        }
    }
}

/// Counters for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub geometry_builds: u64,
    pub buffers_created: u64,
    pub buffers_released: u64,
    pub upload_failures: u64,
}

#[derive(Debug)]
struct CacheEntry {
    series: Arc<DataSeries>,
    /// `None` when the series produced no drawable geometry.
    handle: Option<GeometryHandle>,
}

/// Series id → uploaded geometry, reconciled against successive lists.
#[derive(Debug, Default)]
pub struct RenderCache {
    config: GeometryConfig,
    entries: AHashMap<SeriesId, CacheEntry>,
    /// Draw order, taken from the last reconciled list.
    order: Vec<SeriesId>,
    /// Set only after a reconcile where every series was uploaded.
    synced_list: Option<ListId>,
    stats: CacheStats,
}

impl RenderCache {
    pub fn new(config: GeometryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &GeometryConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: SeriesId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn handle(&self, id: SeriesId) -> Option<&GeometryHandle> {
        self.entries.get(&id)?.handle.as_ref()
    }

    /// Series from the last list that failed to upload and will be retried.
    pub fn pending(&self) -> usize {
        self.order
            .iter()
            .filter(|id| !self.entries.contains_key(id))
            .count()
    }

    /// Bring the cache in line with `list`. Returns whether anything was
    /// examined; `false` means `list` is the list already in sync.
    ///
    /// Upload failures are logged and the series skipped. The next call
    /// retries them even when handed the same list.
    pub fn reconcile(&mut self, ctx: &dyn RenderContext, list: &SeriesList) -> bool {
        if self.synced_list == Some(list.id()) {
            return false;
        }
        profile_scope!("render_cache_reconcile");

        let wanted = list.iter().map(|s| s.id()).collect::<AHashSet<_>>();

        let stale = self
            .entries
            .keys()
            .filter(|id| !wanted.contains(id))
            .copied()
            .collect::<Vec<_>>();
        for id in &stale {
            if let Some(entry) = self.entries.remove(id) {
                self.release_entry(ctx, &entry);
            }
        }

        let mut created = 0usize;
        let mut failed = 0usize;
        for series in list {
            if self.entries.contains_key(&series.id()) {
                continue;
            }
            match self.upload(ctx, series) {
                Ok(entry) => {
                    self.entries.insert(series.id(), entry);
                    created += 1;
                }
                Err(e) => {
                    self.stats.upload_failures += 1;
                    failed += 1;
                    tracing::warn!(series = series.id().raw(), "skipping series this frame: {e}");
                }
            }
        }

        self.order = list.iter().map(|s| s.id()).collect();
        self.synced_list = (failed == 0).then_some(list.id());

        tracing::debug!(
            released = stale.len(),
            created,
            failed,
            cached = self.entries.len(),
            "reconciled render cache"
        );
        true
    }

    fn upload(
        &mut self,
        ctx: &dyn RenderContext,
        series: &Arc<DataSeries>,
    ) -> Result<CacheEntry, GpuError> {
        let geometry = geometry::build(series, &self.config);
        self.stats.geometry_builds += 1;

        let handle = if geometry.is_empty() {
            None
        } else {
            let handle = GeometryHandle::upload(ctx, series.id(), &geometry)?;
            self.stats.buffers_created += handle.buffer_count();
            tracing::trace!(
                series = series.id().raw(),
                vertices = handle.vertex_count,
                mode = ?handle.mode,
                "uploaded series geometry"
            );
            Some(handle)
        };

        Ok(CacheEntry {
            series: series.clone(),
            handle,
        })
    }

    fn release_entry(&mut self, ctx: &dyn RenderContext, entry: &CacheEntry) {
        if let Some(handle) = &entry.handle {
            handle.release(ctx);
            self.stats.buffers_released += handle.buffer_count();
        }
    }

    /// Drawable series in list order.
    pub fn draw_items(&self) -> impl Iterator<Item = (&DataSeries, &GeometryHandle)> {
        self.order.iter().filter_map(|id| {
            let entry = self.entries.get(id)?;
            Some((entry.series.as_ref(), entry.handle.as_ref()?))
        })
    }

    /// Switch geometry settings. Every entry is rebuilt on the next reconcile.
    pub fn set_config(&mut self, ctx: &dyn RenderContext, config: GeometryConfig) {
        if self.config == config {
            return;
        }
        self.config = config;
        self.clear(ctx);
    }

    /// Release every buffer and forget the synced list.
    pub fn clear(&mut self, ctx: &dyn RenderContext) {
        let entries = std::mem::take(&mut self.entries);
        for entry in entries.values() {
            self.release_entry(ctx, entry);
        }
        self.order.clear();
        self.synced_list = None;
    }
}
