//! tidemark core
//!
//! Process-wide plumbing shared by the tidemark crates: tracing setup,
//! puffin profiling hooks and the runtime [`Config`].

pub mod config;
pub mod logging;
pub mod profiling;

pub use config::{Config, ProfilingMode};

/// Install logging and, when requested, start profiling.
///
/// Call once at startup before creating a graphics context.
pub fn init(config: &Config) {
    logging::init_with_filter(config.log_filter.as_deref());
    profiling::init_profiling(config.profiling);
}
