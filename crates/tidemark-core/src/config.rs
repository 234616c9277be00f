/// Runtime configuration for tidemark.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// `tracing` filter directives. `None` uses [`crate::logging::DEFAULT_FILTER`].
    pub log_filter: Option<String>,
    pub profiling: ProfilingMode,
}

impl Config {
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    pub fn with_profiling(mut self, profiling: ProfilingMode) -> Self {
        self.profiling = profiling;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProfilingMode {
    /// Puffin scopes are compiled in but not recorded.
    #[default]
    Off,
    /// Record puffin scopes in-process.
    On,
    /// Record scopes and serve them to `puffin_viewer` over HTTP.
    WithServer,
}
