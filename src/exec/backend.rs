// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The runtime talks to a `ProcessBackend` instead of spawning processes
//! itself. This makes it easy to swap in a fake backend in tests while
//! keeping the production implementation in [`job_runner`].
//!
//! - `RealProcessBackend` is the default implementation used by `cmdrelay`.
//!   It spawns one Tokio task per job which owns the child process and
//!   reports back over the runtime channel.
//! - Tests can provide their own `ProcessBackend` that, for example, records
//!   which jobs were started and emits scripted `RuntimeEvent`s.
//!
//! [`job_runner`]: super::job_runner

use std::future::Future;
use std::pin::Pin;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::engine::{JobId, RuntimeEvent};
use crate::errors::Result;
use crate::protocol::RunRequest;

use super::job_runner::run_job;

/// Default number of bytes read from a child pipe at a time.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Trait abstracting how jobs are executed and terminated.
///
/// Implementations must eventually deliver exactly one
/// `RuntimeEvent::JobExited` or `RuntimeEvent::SpawnFailed` for every
/// started job, after any `RuntimeEvent::JobOutput` for that job.
pub trait ProcessBackend: Send {
    /// Begin executing `request` as job `job`.
    fn start(
        &mut self,
        job: JobId,
        request: RunRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Ask for job `job` to be terminated. Completion is still reported
    /// through the normal exit path.
    fn kill(&mut self, job: JobId) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Internal handle for the currently running job.
///
/// - `cancel` asks the runner to kill its child; taken on first use.
/// - `handle` is the Tokio task that owns the child.
struct ActiveJob {
    id: JobId,
    cancel: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

/// Real process backend used in production.
pub struct RealProcessBackend {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    chunk_size: usize,
    active: Option<ActiveJob>,
}

impl std::fmt::Debug for RealProcessBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealProcessBackend")
            .field("chunk_size", &self.chunk_size)
            .field("active", &self.active.as_ref().map(|a| a.id))
            .finish()
    }
}

impl RealProcessBackend {
    /// Create a backend reporting to the given runtime event sender.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self::with_chunk_size(runtime_tx, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(runtime_tx: mpsc::Sender<RuntimeEvent>, chunk_size: usize) -> Self {
        Self {
            runtime_tx,
            chunk_size: chunk_size.max(1),
            active: None,
        }
    }
}

impl ProcessBackend for RealProcessBackend {
    fn start(
        &mut self,
        job: JobId,
        request: RunRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if let Some(previous) = self.active.take() {
                if !previous.handle.is_finished() {
                    // The queue only starts a job after the previous one
                    // reported its exit, so this runner is just winding down.
                    warn!(
                        job_id = %job,
                        previous = %previous.id,
                        "previous job runner still finishing while starting a new job"
                    );
                }
            }

            let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
            let rt_tx = self.runtime_tx.clone();
            let chunk_size = self.chunk_size;

            let handle = tokio::spawn(async move {
                run_job(job, request, rt_tx, cancel_rx, chunk_size).await;
                debug!(job_id = %job, "job runner future finished");
            });

            self.active = Some(ActiveJob {
                id: job,
                cancel: Some(cancel_tx),
                handle,
            });
            Ok(())
        })
    }

    fn kill(&mut self, job: JobId) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let Some(active) = self.active.as_mut().filter(|a| a.id == job) else {
                debug!(job_id = %job, "kill for job that is not running here; ignoring");
                return Ok(());
            };

            match active.cancel.take() {
                Some(cancel) => {
                    if cancel.send(()).is_err() {
                        debug!(job_id = %job, "job already finished while killing");
                    }
                }
                None => {
                    debug!(job_id = %job, "kill already requested for this job");
                }
            }
            Ok(())
        })
    }
}
