//! Diagnostic logging to stderr. Stdout is reserved for command output.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the global subscriber. `RUST_LOG` overrides `default_filter`.
pub fn init(default_filter: &str) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .without_time()
        .with_filter(env_filter);

    tracing_subscriber::registry().with(fmt_layer).try_init()
}
