//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter
pub const LOG_ENV_VAR: &str = "WTREE_LOG";

/// Installs a stderr subscriber. `WTREE_LOG` wins over the default filter,
/// which is `wtree=info`, or `wtree=debug` when `verbose` is set.
pub fn init_tracing(verbose: bool) {
    let filter = build_filter(verbose, std::env::var(LOG_ENV_VAR).ok());

    // A second init (e.g. in tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .try_init();
}

fn build_filter(verbose: bool, from_env: Option<String>) -> EnvFilter {
    let default_filter = if verbose { "wtree=debug" } else { "wtree=info" };
    from_env
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(default_filter))
}
