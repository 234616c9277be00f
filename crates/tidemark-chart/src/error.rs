use thiserror::Error;

/// Rejected chart input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    #[error("min/max band needs equal top and bottom lengths, got {top} and {bottom}")]
    MismatchedBandLengths { top: usize, bottom: usize },

    #[error("interleaved min/max samples must come in pairs, got {0} values")]
    OddInterleavedLength(usize),

    #[error("sample spacing must be finite and positive, got {0}")]
    InvalidSpacing(f64),

    #[error("point size must be finite and non-negative, got {0}")]
    InvalidPointSize(f32),

    #[error("cannot compute a range over an empty series list")]
    EmptySeries,
}
