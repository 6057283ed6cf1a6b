//! Tracing subscriber setup for hosts embedding the crate
//!
//! Library code only emits `tracing` events. Hosts that want them printed
//! call [`init_tracing`] once at startup.

use crate::error::FirebaseError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global subscriber filtered by `RUST_LOG`
///
/// Without `RUST_LOG`, this crate logs at `info` (or `debug` when
/// `verbose`) and everything else at `warn`. Fails if a global subscriber
/// is already installed.
///
/// # Example
/// ```no_run
/// firebase_auth_flows::logging::init_tracing(false).ok();
/// ```
pub fn init_tracing(verbose: bool) -> Result<(), FirebaseError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("firebase_auth_flows=debug,warn")
            } else {
                EnvFilter::try_new("firebase_auth_flows=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_thread_ids(false)
                .with_line_number(false)
                .with_file(false)
                .compact(),
        )
        .try_init()
        .map_err(|e| FirebaseError::internal(format!("Failed to install tracing subscriber: {}", e)))
}
