use spotcount_core::error::{CountError, Result};
use tracing_subscriber::EnvFilter;

/// Human-readable diagnostics on stderr. `RUST_LOG` takes precedence over `level`.
pub fn init(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| CountError::Config(format!("invalid log filter \"{level}\": {e}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| CountError::Config(format!("logging init: {e}")))
}
