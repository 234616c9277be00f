use tracing_subscriber::EnvFilter;

/// Directives used when neither `RUST_LOG` nor an explicit filter is set.
///
/// GPU backends are noisy at `debug`, so they are held at `warn`.
pub const DEFAULT_FILTER: &str = "info,tidemark_chart=debug,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// Install the global fmt subscriber with [`DEFAULT_FILTER`].
pub fn init() {
    init_with_filter(None);
}

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over `filter`, which wins over [`DEFAULT_FILTER`]. A
/// subscriber that is already installed is left in place.
pub fn init_with_filter(filter: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter.unwrap_or(DEFAULT_FILTER)));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
}
