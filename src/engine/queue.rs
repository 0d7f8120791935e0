// src/engine/queue.rs

use std::collections::VecDeque;

use tracing::debug;

use crate::engine::event_handlers::CoreCommand;
use crate::engine::JobId;
use crate::protocol::{Event, RunRequest};

/// FIFO of run requests with at most one job executing at a time.
///
/// Semantics:
/// - `enqueue` appends; if nothing is running the front is started at once.
/// - `cancel` kills the running job only when nothing is pending. With
///   pending work it flags the *last* pending request instead, so a kill
///   always targets the most recent submission.
/// - Flagged requests stay in place. When their turn comes they produce a
///   single `exit` event with the cancelled code and are never started.
///
/// The queue never performs IO. Every operation returns the [`CoreCommand`]s
/// the runtime should carry out.
#[derive(Debug, Default)]
pub struct JobQueue {
    pending: VecDeque<RunRequest>,
    active: Option<JobId>,
    next_id: u64,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no job is running. Pending is always empty in that case.
    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn active(&self) -> Option<JobId> {
        self.active
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Read-only view of the pending requests, front first.
    pub fn pending(&self) -> impl Iterator<Item = &RunRequest> {
        self.pending.iter()
    }

    /// Append a run request and start it if the queue is idle.
    pub fn enqueue(&mut self, request: RunRequest) -> Vec<CoreCommand> {
        debug!(
            command = %request.display_cmd(),
            pending = self.pending.len(),
            running = ?self.active,
            "enqueueing run request"
        );
        self.pending.push_back(request);

        if self.active.is_none() {
            self.advance()
        } else {
            Vec::new()
        }
    }

    /// Apply a kill request.
    pub fn cancel(&mut self) -> Vec<CoreCommand> {
        if let Some(last) = self.pending.back_mut() {
            debug!(
                command = %last.display_cmd(),
                already_cancelled = last.cancelled,
                "kill flags most recently queued request"
            );
            last.cancelled = true;
            return Vec::new();
        }

        match self.active {
            Some(job) => {
                debug!(job_id = %job, "kill targets running job");
                vec![CoreCommand::Kill(job)]
            }
            None => {
                debug!("kill while idle; ignoring");
                Vec::new()
            }
        }
    }

    /// Flag every pending request and kill the running job, if any.
    pub fn cancel_all(&mut self) -> Vec<CoreCommand> {
        for request in self.pending.iter_mut() {
            request.cancelled = true;
        }

        match self.active {
            Some(job) => vec![CoreCommand::Kill(job)],
            None => self.advance(),
        }
    }

    /// Record that `job` finished and move on to the next pending request.
    ///
    /// Returns `None` when `job` is not the running job (a stale
    /// notification); the caller should drop whatever it was relaying.
    pub fn complete(&mut self, job: JobId) -> Option<Vec<CoreCommand>> {
        if self.active != Some(job) {
            debug!(job_id = %job, active = ?self.active, "completion for inactive job; ignoring");
            return None;
        }

        self.active = None;
        Some(self.advance())
    }

    /// Whether events from `job` should currently be relayed.
    pub fn is_active(&self, job: JobId) -> bool {
        self.active == Some(job)
    }

    /// Pop pending requests front-first until one can be started.
    ///
    /// Cancelled requests are resolved inline with their exit event.
    fn advance(&mut self) -> Vec<CoreCommand> {
        let mut commands = Vec::new();

        while let Some(request) = self.pending.pop_front() {
            if request.cancelled {
                debug!(
                    command = %request.display_cmd(),
                    "skipping cancelled request"
                );
                commands.push(CoreCommand::Emit(Event::cancelled()));
                continue;
            }

            self.next_id += 1;
            let job = JobId(self.next_id);
            self.active = Some(job);
            commands.push(CoreCommand::Start { job, request });
            return commands;
        }

        self.active = None;
        commands
    }
}
