// src/config/model.rs

use serde::Deserialize;

use crate::exec::DEFAULT_CHUNK_SIZE;
use crate::types::InputClosePolicy;

/// Default capacity of the runtime event channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Configuration exactly as read from a TOML file.
///
/// ```toml
/// [relay]
/// on_input_close = "drain"
/// chunk_size = 8192
/// channel_capacity = 64
/// ```
///
/// All sections and keys are optional. Turn this into a [`ConfigFile`] with
/// `ConfigFile::try_from`, which validates it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub relay: RelaySection,
}

/// `[relay]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RelaySection {
    /// `"drain"` (default) or `"kill"`.
    #[serde(default)]
    pub on_input_close: InputClosePolicy,

    /// Bytes read from a child pipe per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Capacity of the channel feeding the runtime loop.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            on_input_close: InputClosePolicy::default(),
            chunk_size: default_chunk_size(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Validated configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    relay: RelaySection,
}

impl ConfigFile {
    /// Wrap an already validated section. Prefer `ConfigFile::try_from`.
    pub(crate) fn new_unchecked(relay: RelaySection) -> Self {
        Self { relay }
    }

    pub fn relay(&self) -> &RelaySection {
        &self.relay
    }
}
