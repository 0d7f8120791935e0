// src/engine/mod.rs

//! Orchestration engine for cmdrelay.
//!
//! This module ties together:
//! - the job queue (FIFO, one job at a time, kill semantics)
//! - the main runtime event loop that reacts to:
//!   - decoded input requests
//!   - child output chunks and exit notifications
//!   - input close / shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::fmt;

use crate::protocol::{DecodeError, Event, Request};
use crate::types::InputClosePolicy;

/// Identifier of one dequeued job, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// What happens to queued and running jobs once stdin closes.
    pub on_input_close: InputClosePolicy,
}

/// Events flowing into the runtime from the input reader and job runners.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A well-formed record arrived on the input stream.
    Request(Request),
    /// An input record could not be decoded.
    Malformed(DecodeError),
    /// The input stream reached EOF (or failed).
    InputClosed,
    /// A running job produced a stdout/stderr event.
    JobOutput { job: JobId, event: Event },
    /// The job's command could not be spawned.
    SpawnFailed { job: JobId, reason: String },
    /// The job's child has exited and both of its pipes are drained.
    JobExited { job: JobId, code: i32 },
    /// Shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::JobQueue;
pub use runtime::Runtime;
