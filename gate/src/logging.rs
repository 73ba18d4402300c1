use tracing_subscriber::EnvFilter;

use crate::{ConfigError, LogConfig};

/// Installs a global fmt subscriber. `RUST_LOG` overrides `cfg.level`.
///
/// Fails if the directive does not parse or a subscriber is already set.
pub fn init_logging(cfg: &LogConfig) -> Result<(), ConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&cfg.level).map_err(|e| ConfigError::Logging(e.to_string()))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))
}
