//! Subscriber setup for hosts that do not install their own.
//!
//! The library only emits `tracing` events. Executables and bridges that want to
//! see them call [`init_logging`] once; the filter comes from `FORM_BINDER_LOG`.

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "FORM_BINDER_LOG";
pub const DEFAULT_DIRECTIVES: &str = "form_binder=info";

/// Filter from `FORM_BINDER_LOG`, or the default directives when unset or unreadable
pub fn env_filter() -> EnvFilter {
    match std::env::var(LOG_ENV) {
        Ok(directives) => EnvFilter::builder()
            .parse(&directives)
            .unwrap_or_else(|e| {
                eprintln!("[form-binder] ignoring {}: {}", LOG_ENV, e);
                EnvFilter::new(DEFAULT_DIRECTIVES)
            }),
        Err(_) => EnvFilter::new(DEFAULT_DIRECTIVES),
    }
}

/// Install a stderr fmt subscriber. Returns false when a global subscriber was
/// already set, which leaves that one in place.
pub fn init_logging() -> bool {
    let subscriber = tracing_subscriber::registry().with(env_filter()).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true),
    );
    let installed = tracing::subscriber::set_global_default(subscriber).is_ok();
    if installed {
        tracing::debug!(env = LOG_ENV, "logging initialized");
    }
    installed
}
