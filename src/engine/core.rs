// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from the runtime channel
//! - writing events through the emitter
//! - starting and killing child processes through the backend
//!
//! The core is intended to be extensively unit tested without any Tokio,
//! channels, or processes.

use tracing::debug;

use crate::engine::event_handlers::{
    handle_input_closed, handle_job_exit, handle_job_output, handle_malformed,
    handle_request, handle_spawn_failure, CoreCommand, CoreStep,
};
use crate::engine::queue::JobQueue;
use crate::engine::{RuntimeEvent, RuntimeOptions};
use crate::types::InputClosePolicy;

/// Pure core runtime state.
///
/// This owns:
/// - the job queue (pending requests and the running job)
/// - runtime options (e.g. the input-close policy)
/// - whether the input stream has closed
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    queue: JobQueue,
    options: RuntimeOptions,
    input_closed: bool,
}

impl CoreRuntime {
    pub fn new(options: RuntimeOptions) -> Self {
        Self {
            queue: JobQueue::new(),
            options,
            input_closed: false,
        }
    }

    /// Expose whether a job is running (for tests).
    pub fn is_idle(&self) -> bool {
        self.queue.is_idle()
    }

    /// Expose the queue (for tests).
    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    /// Whether input has closed or shutdown was requested (for tests).
    pub fn input_closed(&self) -> bool {
        self.input_closed
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        let mut step = match event {
            RuntimeEvent::Request(request) if self.input_closed => {
                debug!(?request, "request after shutdown; ignoring");
                CoreStep::continue_with(Vec::new())
            }
            RuntimeEvent::Request(request) => handle_request(&mut self.queue, request),
            RuntimeEvent::Malformed(err) => handle_malformed(err),
            RuntimeEvent::JobOutput { job, event } => {
                handle_job_output(&self.queue, job, event)
            }
            RuntimeEvent::SpawnFailed { job, reason } => {
                handle_spawn_failure(&mut self.queue, job, &reason)
            }
            RuntimeEvent::JobExited { job, code } => {
                handle_job_exit(&mut self.queue, job, code)
            }
            RuntimeEvent::InputClosed => {
                self.input_closed = true;
                handle_input_closed(&mut self.queue, &self.options)
            }
            RuntimeEvent::ShutdownRequested => {
                self.input_closed = true;
                let options = RuntimeOptions {
                    on_input_close: InputClosePolicy::Kill,
                };
                handle_input_closed(&mut self.queue, &options)
            }
        };

        // Once input is gone and the queue has fully drained there is nothing
        // left that could produce another event.
        if self.input_closed && self.queue.is_idle() {
            step.keep_running = false;
            step.commands.push(CoreCommand::RequestExit);
        }

        step
    }
}
