// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{RelayError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RelayError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.relay))
    }
}

/// Check basic sanity of a raw config.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.relay.chunk_size == 0 {
        return Err(RelayError::ConfigError(
            "[relay].chunk_size must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.relay.channel_capacity == 0 {
        return Err(RelayError::ConfigError(
            "[relay].channel_capacity must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}
