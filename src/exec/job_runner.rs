// src/exec/job_runner.rs

//! Individual job process runner.

use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::engine::{JobId, RuntimeEvent};
use crate::exec::stream::spawn_stream_relay;
use crate::protocol::{Event, OutputStream, RunRequest};
use crate::types::{CANCELLED_CODE, UNKNOWN_EXIT_CODE};

/// Run a single job to completion, relaying its output and exit.
///
/// Lifecycle: `spawning → {failed | running} → exited`.
///
/// - A request already flagged as cancelled reports the cancelled code and is
///   never spawned.
/// - A spawn failure reports `SpawnFailed` and nothing else.
/// - Otherwise each chunk read from stdout/stderr is forwarded as soon as it
///   arrives, and `JobExited` is sent once the child has been reaped **and**
///   both pipes hit EOF, so it always follows the job's last output.
/// - If the cancel channel fires, the child is killed and its exit is
///   reported through the same path.
pub async fn run_job(
    job: JobId,
    request: RunRequest,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    cancel_rx: oneshot::Receiver<()>,
    chunk_size: usize,
) {
    if request.cancelled {
        debug!(job_id = %job, "request cancelled before start; not spawning");
        send(&runtime_tx, RuntimeEvent::JobExited { job, code: CANCELLED_CODE }).await;
        return;
    }

    let mut cmd = Command::new(&request.command);
    cmd.args(&request.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            send(
                &runtime_tx,
                RuntimeEvent::SpawnFailed {
                    job,
                    reason: err.to_string(),
                },
            )
            .await;
            return;
        }
    };

    info!(
        job_id = %job,
        pid = ?child.id(),
        command = %request.display_cmd(),
        "child process spawned"
    );

    let relays = [
        spawn_stream_relay(
            job,
            OutputStream::Stdout,
            child.stdout.take(),
            runtime_tx.clone(),
            chunk_size,
        ),
        spawn_stream_relay(
            job,
            OutputStream::Stderr,
            child.stderr.take(),
            runtime_tx.clone(),
            chunk_size,
        ),
    ];

    let code = wait_for_exit(job, &mut child, cancel_rx, &runtime_tx).await;

    for relay in relays.into_iter().flatten() {
        if let Err(err) = relay.await {
            warn!(job_id = %job, error = %err, "stream relay task failed");
        }
    }

    send(&runtime_tx, RuntimeEvent::JobExited { job, code }).await;
}

/// Wait for the child to exit, killing it first if cancellation arrives.
async fn wait_for_exit(
    job: JobId,
    child: &mut Child,
    mut cancel_rx: oneshot::Receiver<()>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) -> i32 {
    let status = tokio::select! {
        status = child.wait() => status,

        cancel = &mut cancel_rx => {
            match cancel {
                Ok(()) => {
                    info!(job_id = %job, "kill requested; terminating child process");
                    if let Err(err) = child.start_kill() {
                        warn!(job_id = %job, error = %err, "failed to kill child process");
                    }
                }
                Err(_) => {
                    debug!(job_id = %job, "cancel channel closed without a kill request");
                }
            }
            child.wait().await
        }
    };

    match status {
        Ok(status) => {
            let code = exit_code(status);
            debug!(job_id = %job, exit_code = code, success = status.success(), "child reaped");
            code
        }
        Err(err) => {
            warn!(job_id = %job, error = %err, "failed waiting on child process");
            send(
                runtime_tx,
                RuntimeEvent::JobOutput {
                    job,
                    event: Event::error(&err),
                },
            )
            .await;
            UNKNOWN_EXIT_CODE
        }
    }
}

/// Map an exit status onto the protocol's integer code.
///
/// Signal deaths use the shell convention `128 + signal`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    UNKNOWN_EXIT_CODE
}

async fn send(runtime_tx: &mpsc::Sender<RuntimeEvent>, event: RuntimeEvent) {
    if let Err(err) = runtime_tx.send(event).await {
        debug!(error = %err, "runtime gone; dropping job event");
    }
}
