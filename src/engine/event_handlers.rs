// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, info, warn};

use crate::engine::queue::JobQueue;
use crate::engine::{JobId, RuntimeOptions};
use crate::protocol::{DecodeError, Event, Request, RunRequest};
use crate::types::InputClosePolicy;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Write this event to the output stream.
    Emit(Event),
    /// Spawn the request's command as job `job`.
    Start { job: JobId, request: RunRequest },
    /// Forcefully terminate the child of job `job`.
    Kill(JobId),
    /// Request that the runtime stops (input closed and nothing left to do).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Handle a decoded input request.
pub fn handle_request(queue: &mut JobQueue, request: Request) -> CoreStep {
    let commands = match request {
        Request::Run(run) => queue.enqueue(run),
        Request::Kill => queue.cancel(),
    };
    CoreStep::continue_with(commands)
}

/// Handle an input record that failed to decode.
///
/// The record is dropped and a diagnostic goes out as a `stderr` event.
///
/// The diagnostic is emitted right away, not queued behind the running job,
/// so it can land between that job's output events. Consumers splitting the
/// stream at `exit` will see it inside the running job's slice; it is not
/// output of that job.
pub fn handle_malformed(err: DecodeError) -> CoreStep {
    warn!(error = %err, "dropping malformed input record");
    let event = Event::Stderr {
        data: format!("Error: invalid request: {err}\n"),
    };
    CoreStep::continue_with(vec![CoreCommand::Emit(event)])
}

/// Relay output from a running job.
pub fn handle_job_output(queue: &JobQueue, job: JobId, event: Event) -> CoreStep {
    if !queue.is_active(job) {
        debug!(job_id = %job, ?event, "output from inactive job; dropping");
        return CoreStep::continue_with(Vec::new());
    }
    CoreStep::continue_with(vec![CoreCommand::Emit(event)])
}

/// Handle a job whose command could not be spawned.
pub fn handle_spawn_failure(queue: &mut JobQueue, job: JobId, reason: &str) -> CoreStep {
    warn!(job_id = %job, reason, "failed to spawn command");
    finish_job(queue, job, Event::spawn_failed())
}

/// Handle a job whose child exited.
pub fn handle_job_exit(queue: &mut JobQueue, job: JobId, code: i32) -> CoreStep {
    info!(job_id = %job, exit_code = code, "job finished");
    finish_job(queue, job, Event::exit(code))
}

/// Handle EOF on the input stream, applying the configured policy.
pub fn handle_input_closed(queue: &mut JobQueue, options: &RuntimeOptions) -> CoreStep {
    info!(
        policy = ?options.on_input_close,
        running = ?queue.active(),
        pending = queue.pending_len(),
        "input closed"
    );

    let commands = match options.on_input_close {
        InputClosePolicy::Drain => Vec::new(),
        InputClosePolicy::Kill => queue.cancel_all(),
    };
    CoreStep::continue_with(commands)
}

/// Emit the terminal event for `job`, then advance the queue.
fn finish_job(queue: &mut JobQueue, job: JobId, exit: Event) -> CoreStep {
    match queue.complete(job) {
        Some(next) => {
            let mut commands = Vec::with_capacity(next.len() + 1);
            commands.push(CoreCommand::Emit(exit));
            commands.extend(next);
            CoreStep::continue_with(commands)
        }
        None => CoreStep::continue_with(Vec::new()),
    }
}
