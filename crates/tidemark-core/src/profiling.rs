//! Profiling utilities based on the `puffin` crate.
//!
//! With the `profiling` feature disabled the scope macros expand to nothing
//! and the functions are no-ops, so callers never need their own `cfg`.

use crate::config::ProfilingMode;

#[cfg(feature = "profiling")]
pub use puffin::{profile_function, profile_scope};

#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! profile_function {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "profiling"))]
#[macro_export]
macro_rules! profile_scope {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "profiling"))]
pub use crate::{profile_function, profile_scope};

/// Address the puffin HTTP server listens on.
pub const SERVER_ADDR: &str = "0.0.0.0:8585";

#[cfg(feature = "profiling")]
static PROFILING_SERVER: std::sync::OnceLock<puffin_http::Server> = std::sync::OnceLock::new();

/// Enable puffin according to `mode`.
///
/// # Example
/// ```no_run
/// use tidemark_core::{profiling::init_profiling, ProfilingMode};
///
/// init_profiling(ProfilingMode::WithServer);
/// ```
#[cfg(feature = "profiling")]
pub fn init_profiling(mode: ProfilingMode) {
    match mode {
        ProfilingMode::Off => puffin::set_scopes_on(false),
        ProfilingMode::On => puffin::set_scopes_on(true),
        ProfilingMode::WithServer => {
            puffin::set_scopes_on(true);
            if PROFILING_SERVER.get().is_some() {
                return;
            }
            match puffin_http::Server::new(SERVER_ADDR) {
                Ok(server) => {
                    tracing::info!("Puffin profiler server started on http://{SERVER_ADDR}");
                    let _ = PROFILING_SERVER.set(server);
                }
                Err(e) => tracing::error!("Failed to start puffin server: {e}"),
            }
        }
    }
}

#[cfg(not(feature = "profiling"))]
pub fn init_profiling(mode: ProfilingMode) {
    if mode != ProfilingMode::Off {
        tracing::warn!("profiling requested but the `profiling` feature is disabled");
    }
}

/// Mark a frame boundary. Call once per rendered frame.
#[inline]
pub fn new_frame() {
    #[cfg(feature = "profiling")]
    puffin::GlobalProfiler::lock().new_frame();
}
