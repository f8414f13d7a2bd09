use crate::env::Environment;
use tracing_subscriber::EnvFilter;

/// Set to `1` by the runner when step debug logging is enabled.
pub const RUNNER_DEBUG_VAR: &str = "RUNNER_DEBUG";

/// Default filter directive when `RUST_LOG` is not set.
pub fn default_directive(env: &dyn Environment) -> &'static str {
    match env.var(RUNNER_DEBUG_VAR).as_deref() {
        Some("1") => "debug",
        _ => "info",
    }
}

/// Installs the diagnostics subscriber.
///
/// Logs go to stderr; stdout carries workflow commands only.
pub fn init(env: &dyn Environment) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(env)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
