//! Structured logging via the tracing ecosystem and a metrics facade for the
//! identity core's counters and gauges.

pub mod metrics;

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize tracing with an env-filter driven subscriber.
///
/// Respects `RUST_LOG`; falls back to `info` for this crate. Safe to call once
/// per process; subsequent calls are ignored.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("passage={}", default_level)));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing("debug");
        init_tracing("info");
    }
}
