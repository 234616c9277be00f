//! GPU feature selection.

use bitflags::bitflags;

bitflags! {
    /// Optional device features tidemark knows how to use.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct GpuFeatures: u32 {
        /// Push constants carry per-draw colour, offset and point size.
        /// Chart rendering requires this.
        const PUSH_CONSTANTS = 1 << 0;

        /// Line polygon mode, used for wireframe debugging of band and
        /// stroke triangulations.
        const POLYGON_MODE_LINE = 1 << 1;
    }
}

impl GpuFeatures {
    pub fn to_wgpu(self) -> wgpu::Features {
        let mut features = wgpu::Features::empty();
        if self.contains(GpuFeatures::PUSH_CONSTANTS) {
            features |= wgpu::Features::PUSH_CONSTANTS;
        }
        if self.contains(GpuFeatures::POLYGON_MODE_LINE) {
            features |= wgpu::Features::POLYGON_MODE_LINE;
        }
        features
    }

    /// Only features with a matching flag are kept.
    pub fn from_wgpu(features: wgpu::Features) -> Self {
        let mut gpu_features = GpuFeatures::empty();
        if features.contains(wgpu::Features::PUSH_CONSTANTS) {
            gpu_features |= GpuFeatures::PUSH_CONSTANTS;
        }
        if features.contains(wgpu::Features::POLYGON_MODE_LINE) {
            gpu_features |= GpuFeatures::POLYGON_MODE_LINE;
        }
        gpu_features
    }

    pub fn check_support(self, adapter: &wgpu::Adapter) -> FeatureSupportResult {
        let missing = self - GpuFeatures::from_wgpu(adapter.features());
        if missing.is_empty() {
            FeatureSupportResult::Supported
        } else {
            FeatureSupportResult::Missing(missing)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSupportResult {
    Supported,
    Missing(GpuFeatures),
}

impl FeatureSupportResult {
    pub fn missing(&self) -> Option<GpuFeatures> {
        match self {
            FeatureSupportResult::Supported => None,
            FeatureSupportResult::Missing(features) => Some(*features),
        }
    }
}
