use thiserror::Error;

/// Failure creating a GPU resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GpuError {
    /// The requested buffer exceeds the device's `max_buffer_size`.
    #[error("buffer {label:?} of {size} bytes exceeds the device limit of {max} bytes")]
    BufferTooLarge {
        label: Option<String>,
        size: u64,
        max: u64,
    },

    /// The device could not allocate the resource.
    #[error("out of GPU memory while creating {label:?}")]
    OutOfMemory { label: Option<String> },

    /// Shader source failed to parse or validate.
    #[error("shader {label:?} failed to compile: {message}")]
    ShaderCompilation {
        label: Option<String>,
        message: String,
    },

    /// Any other validation error reported by the device.
    #[error("GPU validation error: {0}")]
    Validation(String),
}
