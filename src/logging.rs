//! Diagnostic logging.
//!
//! Operator output goes through [`Console`](crate::console::Console); this
//! is only for diagnostics, written to stderr without colors.

use std::env;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter variable consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "KWDEBUG_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Filter directives from `KWDEBUG_LOG`, then `RUST_LOG`, else `warn`.
pub fn filter_directives() -> String {
    env::var(LOG_ENV)
        .or_else(|_| env::var(EnvFilter::DEFAULT_ENV))
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install the global subscriber. Calling it again is harmless.
pub fn init_logging() {
    let directives = filter_directives();
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|err| {
        eprintln!("kwdebug: invalid log filter {:?}: {}", directives, err);
        EnvFilter::new(DEFAULT_FILTER)
    });

    let layer = fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(std::io::stderr);

    if tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .is_ok()
    {
        tracing::debug!(filter = %directives, "logging initialized");
    }
}
