use crate::features::GpuFeatures;
use std::sync::Arc;
use thiserror::Error;

/// Failure to bring up a device.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("no suitable GPU adapter: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("adapter {adapter:?} lacks required features {missing:?}")]
    MissingFeatures {
        adapter: String,
        missing: GpuFeatures,
    },

    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// Shared device, queue and the features that were enabled on them.
///
/// Created once and handed around as `Arc<GraphicsContext>`:
///
/// ```rust,no_run
/// use tidemark_render::GraphicsContext;
///
/// let ctx = GraphicsContext::new_owned_sync()?;
/// let shared = ctx.clone();
/// # Ok::<(), tidemark_render::ContextError>(())
/// ```
pub struct GraphicsContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    enabled_features: GpuFeatures,
}

impl GraphicsContext {
    /// Context with the default descriptor, which requires push constants.
    pub async fn new_owned() -> Result<Arc<Self>, ContextError> {
        Self::new_owned_with_descriptor(GraphicsContextDescriptor::default()).await
    }

    /// Blocking variant of [`GraphicsContext::new_owned`].
    pub fn new_owned_sync() -> Result<Arc<Self>, ContextError> {
        pollster::block_on(Self::new_owned())
    }

    pub async fn new_owned_with_descriptor(
        descriptor: GraphicsContextDescriptor,
    ) -> Result<Arc<Self>, ContextError> {
        Self::create(descriptor).await.map(Arc::new)
    }

    async fn create(descriptor: GraphicsContextDescriptor) -> Result<Self, ContextError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: descriptor.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: descriptor.power_preference,
                compatible_surface: None,
                force_fallback_adapter: descriptor.force_fallback_adapter,
            })
            .await?;

        if let Some(missing) = descriptor
            .required_gpu_features
            .check_support(&adapter)
            .missing()
        {
            return Err(ContextError::MissingFeatures {
                adapter: adapter.get_info().name,
                missing,
            });
        }

        let supported = GpuFeatures::from_wgpu(adapter.features());
        let available_requested = descriptor.requested_gpu_features & supported;
        let unavailable_requested = descriptor.requested_gpu_features - available_requested;
        if !unavailable_requested.is_empty() {
            tracing::warn!(
                "Some requested GPU features are not available: {:?}",
                unavailable_requested
            );
        }

        let enabled_features = descriptor.required_gpu_features | available_requested;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: descriptor.label,
                required_features: enabled_features.to_wgpu(),
                required_limits: descriptor.limits.clone(),
                ..Default::default()
            })
            .await?;

        tracing::info!(
            adapter = %adapter.get_info().name,
            "Created graphics context with features: {:?}",
            enabled_features
        );

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            enabled_features,
        })
    }

    pub fn info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }

    pub fn gpu_features(&self) -> GpuFeatures {
        self.enabled_features
    }

    pub fn has_feature(&self, feature: GpuFeatures) -> bool {
        self.enabled_features.contains(feature)
    }

    #[inline]
    pub fn max_buffer_size(&self) -> u64 {
        self.device.limits().max_buffer_size
    }

    /// Zero when push constants are not enabled.
    #[inline]
    pub fn max_push_constant_size(&self) -> u32 {
        self.device.limits().max_push_constant_size
    }
}

/// Bytes of push constants chart pipelines need.
pub(crate) const CHART_PUSH_CONSTANT_BYTES: u32 = 32;

/// Settings for [`GraphicsContext`] creation.
pub struct GraphicsContextDescriptor {
    pub backends: wgpu::Backends,
    pub power_preference: wgpu::PowerPreference,
    pub force_fallback_adapter: bool,
    /// Creation fails if any of these is unsupported.
    pub required_gpu_features: GpuFeatures,
    /// Enabled when available, logged at `warn` otherwise.
    pub requested_gpu_features: GpuFeatures,
    pub limits: wgpu::Limits,
    pub label: Option<&'static str>,
}

impl Default for GraphicsContextDescriptor {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            required_gpu_features: GpuFeatures::PUSH_CONSTANTS,
            requested_gpu_features: GpuFeatures::empty(),
            limits: wgpu::Limits {
                max_push_constant_size: CHART_PUSH_CONSTANT_BYTES,
                ..wgpu::Limits::default()
            },
            label: Some("tidemark device"),
        }
    }
}

impl GraphicsContextDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_requested_features(mut self, features: GpuFeatures) -> Self {
        self.requested_gpu_features |= features;
        self
    }

    pub fn with_backends(mut self, backends: wgpu::Backends) -> Self {
        self.backends = backends;
        self
    }

    pub fn with_power_preference(mut self, preference: wgpu::PowerPreference) -> Self {
        self.power_preference = preference;
        self
    }

    /// Prefer a software adapter, useful on headless CI.
    pub fn with_fallback_adapter(mut self, force: bool) -> Self {
        self.force_fallback_adapter = force;
        self
    }

    pub fn with_limits(mut self, limits: wgpu::Limits) -> Self {
        self.limits = limits;
        self
    }
}
