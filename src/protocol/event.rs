// src/protocol/event.rs

use serde::{Deserialize, Serialize};

use crate::types::{CANCELLED_CODE, SPAWN_FAILURE_CODE};

/// One outbound protocol record.
///
/// Serialized with an `event` tag, e.g. `{"event":"exit","code":0}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Event {
    Stdout { data: String },
    Stderr { data: String },
    Exit { code: i32 },
}

impl Event {
    pub fn exit(code: i32) -> Self {
        Event::Exit { code }
    }

    pub fn spawn_failed() -> Self {
        Event::Exit {
            code: SPAWN_FAILURE_CODE,
        }
    }

    pub fn cancelled() -> Self {
        Event::Exit {
            code: CANCELLED_CODE,
        }
    }

    /// `stderr` record carrying an error description.
    pub fn error(message: impl std::fmt::Display) -> Self {
        Event::Stderr {
            data: format!("Error: {message}"),
        }
    }

    /// Whether this event ends a job's event stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::Exit { .. })
    }

    /// Single-line JSON rendering, without the trailing newline.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Which child pipe a chunk of output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputStream::Stdout => "stdout",
            OutputStream::Stderr => "stderr",
        }
    }

    /// Wrap a chunk of output as the matching event.
    pub fn event(self, data: String) -> Event {
        match self {
            OutputStream::Stdout => Event::Stdout { data },
            OutputStream::Stderr => Event::Stderr { data },
        }
    }
}
