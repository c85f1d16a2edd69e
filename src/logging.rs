use tracing_subscriber::{fmt, EnvFilter};

use crate::errors::{StoreError, StoreResult};

/// Install the global fmt subscriber. `RUST_LOG` takes precedence over
/// `level`; an unparsable directive falls back to `info`.
pub fn init_tracing(level: &str) -> StoreResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| StoreError::config(format!("failed to create log filter: {err}")))?;

    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| StoreError::config(format!("tracing init error: {err}")))?;
    Ok(())
}
