//! GPU resource wrappers that can be real or mock.
//!
//! Every wrapper carries a [`ResourceId`] so draw code can tell whether the
//! resource it is about to bind is the one already bound, without relying on
//! `wgpu` handle comparison.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a wrapped GPU resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

impl ResourceId {
    /// Allocate a fresh id for a real resource.
    pub fn next() -> Self {
        Self(NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Wrapper around a GPU buffer that can be real or mock.
///
/// Cloning is cheap; `wgpu::Buffer` is reference counted.
#[derive(Clone, Debug)]
pub struct GpuBuffer {
    id: ResourceId,
    size: u64,
    inner: GpuBufferInner,
}

#[derive(Clone, Debug)]
enum GpuBufferInner {
    Real(wgpu::Buffer),
    #[cfg(feature = "mock")]
    Mock,
}

impl GpuBuffer {
    pub fn from_wgpu(buffer: wgpu::Buffer) -> Self {
        Self {
            id: ResourceId::next(),
            size: buffer.size(),
            inner: GpuBufferInner::Real(buffer),
        }
    }

    #[cfg(feature = "mock")]
    pub fn mock(id: u64, size: u64) -> Self {
        Self {
            id: ResourceId(id),
            size,
            inner: GpuBufferInner::Mock,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Get the underlying `wgpu::Buffer`.
    ///
    /// # Panics
    /// Panics for a mock buffer. Only real contexts and real passes call this.
    pub fn as_wgpu(&self) -> &wgpu::Buffer {
        match &self.inner {
            GpuBufferInner::Real(buffer) => buffer,
            #[cfg(feature = "mock")]
            GpuBufferInner::Mock => panic!("mock buffer {:?} has no wgpu::Buffer", self.id),
        }
    }

    #[cfg(feature = "mock")]
    pub fn is_mock(&self) -> bool {
        matches!(self.inner, GpuBufferInner::Mock)
    }
}

macro_rules! gpu_wrapper {
    ($(#[$meta:meta])* $name:ident, $inner:ident, $wgpu:ty) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        pub struct $name {
            id: ResourceId,
            inner: $inner,
        }

        #[derive(Clone, Debug)]
        enum $inner {
            Real($wgpu),
            #[cfg(feature = "mock")]
            Mock,
        }

        impl $name {
            pub fn from_wgpu(resource: $wgpu) -> Self {
                Self {
                    id: ResourceId::next(),
                    inner: $inner::Real(resource),
                }
            }

            #[cfg(feature = "mock")]
            pub fn mock(id: u64) -> Self {
                Self {
                    id: ResourceId(id),
                    inner: $inner::Mock,
                }
            }

            pub fn id(&self) -> ResourceId {
                self.id
            }

            /// # Panics
            /// Panics for a mock resource.
            pub fn as_wgpu(&self) -> &$wgpu {
                match &self.inner {
                    $inner::Real(resource) => resource,
                    #[cfg(feature = "mock")]
                    $inner::Mock => panic!(
                        concat!("mock ", stringify!($name), " {:?} has no wgpu handle"),
                        self.id
                    ),
                }
            }

            #[cfg(feature = "mock")]
            pub fn is_mock(&self) -> bool {
                matches!(self.inner, $inner::Mock)
            }
        }
    };
}

gpu_wrapper!(
    /// Wrapper around a compiled shader module.
    GpuShaderModule,
    GpuShaderModuleInner,
    wgpu::ShaderModule
);
gpu_wrapper!(
    /// Wrapper around a render pipeline.
    GpuRenderPipeline,
    GpuRenderPipelineInner,
    wgpu::RenderPipeline
);
gpu_wrapper!(
    GpuBindGroupLayout,
    GpuBindGroupLayoutInner,
    wgpu::BindGroupLayout
);
gpu_wrapper!(GpuBindGroup, GpuBindGroupInner, wgpu::BindGroup);
