// src/engine/runtime.rs

use std::fmt;

use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::emit::EventEmitter;
use crate::errors::Result;
use crate::exec::ProcessBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, RuntimeEvent};

/// Drives the job queue in response to `RuntimeEvent`s, writes protocol
/// events through the emitter, and delegates process handling to a
/// `ProcessBackend`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics. It is the single consumer of the runtime channel, so
/// queue state is never touched from two places at once.
pub struct Runtime<B: ProcessBackend, W> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    backend: B,
    emitter: EventEmitter<W>,
}

impl<B: ProcessBackend, W> fmt::Debug for Runtime<B, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("emitter", &self.emitter)
            .finish_non_exhaustive()
    }
}

impl<B, W> Runtime<B, W>
where
    B: ProcessBackend,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        backend: B,
        emitter: EventEmitter<W>,
    ) -> Self {
        Self {
            core,
            event_rx,
            backend,
            emitter,
        }
    }

    /// Main event loop.
    ///
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Feeds them into the core runtime.
    /// - Executes commands returned by the core (emit, start, kill, exit).
    ///
    /// Returns once input has closed and the queue is drained, or when the
    /// output stream can no longer be written.
    pub async fn run(mut self) -> Result<()> {
        info!("cmdrelay runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                if let Err(err) = self.execute_command(command).await {
                    error!(error = %err, "runtime command failed; stopping");
                    return Err(err);
                }
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!(
            events = self.emitter.events_written(),
            "runtime exiting"
        );
        Ok(())
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::Emit(event) => {
                self.emitter.emit(&event).await?;
            }
            CoreCommand::Start { job, request } => {
                info!(
                    job_id = %job,
                    command = %request.display_cmd(),
                    "starting job"
                );
                self.backend.start(job, request).await?;
            }
            CoreCommand::Kill(job) => {
                info!(job_id = %job, "killing running job");
                self.backend.kill(job).await?;
            }
            CoreCommand::RequestExit => {
                // keep_running is already false alongside this command; it is
                // only logged here.
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }
}
