use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use cmdrelay::engine::{JobId, RuntimeEvent};
use cmdrelay::errors::Result;
use cmdrelay::exec::ProcessBackend;
use cmdrelay::protocol::{Event, RunRequest};

/// Exit code the fake reports for a killed job (SIGKILL under the shell
/// convention).
pub const FAKE_KILLED_CODE: i32 = 137;

/// Scripted behaviour for a command name.
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    /// Emit the given output, then exit with `code`.
    Exit {
        stdout: Vec<String>,
        stderr: Vec<String>,
        code: i32,
    },
    /// Report a spawn failure.
    SpawnFail,
    /// Never exit on its own; only a kill finishes it.
    Hang,
}

impl FakeOutcome {
    pub fn ok() -> Self {
        FakeOutcome::Exit {
            stdout: Vec::new(),
            stderr: Vec::new(),
            code: 0,
        }
    }

    pub fn stdout(text: &str) -> Self {
        FakeOutcome::Exit {
            stdout: vec![text.to_string()],
            stderr: Vec::new(),
            code: 0,
        }
    }
}

/// A fake backend that:
/// - records which jobs were started and which were killed
/// - plays back a scripted outcome per command name (default: exit 0)
///
/// Events are sent from a spawned task so the runtime loop is never blocked
/// on its own channel.
pub struct FakeBackend {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    scripts: HashMap<String, FakeOutcome>,
    started: Arc<Mutex<Vec<(JobId, String)>>>,
    killed: Arc<Mutex<Vec<JobId>>>,
    hanging: Option<JobId>,
}

impl FakeBackend {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            runtime_tx,
            scripts: HashMap::new(),
            started: Arc::new(Mutex::new(Vec::new())),
            killed: Arc::new(Mutex::new(Vec::new())),
            hanging: None,
        }
    }

    pub fn script(mut self, command: &str, outcome: FakeOutcome) -> Self {
        self.scripts.insert(command.to_string(), outcome);
        self
    }

    /// Shared handle to the list of started `(job, command)` pairs.
    pub fn started_handle(&self) -> Arc<Mutex<Vec<(JobId, String)>>> {
        Arc::clone(&self.started)
    }

    /// Shared handle to the list of killed jobs.
    pub fn killed_handle(&self) -> Arc<Mutex<Vec<JobId>>> {
        Arc::clone(&self.killed)
    }

    fn send_later(&self, events: Vec<RuntimeEvent>) {
        let tx = self.runtime_tx.clone();
        tokio::spawn(async move {
            for event in events {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
        });
    }
}

impl ProcessBackend for FakeBackend {
    fn start(
        &mut self,
        job: JobId,
        request: RunRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.started
                .lock()
                .unwrap()
                .push((job, request.command.clone()));

            let outcome = self
                .scripts
                .get(&request.command)
                .cloned()
                .unwrap_or_else(FakeOutcome::ok);

            match outcome {
                FakeOutcome::Exit {
                    stdout,
                    stderr,
                    code,
                } => {
                    let mut events = Vec::new();
                    for data in stdout {
                        events.push(RuntimeEvent::JobOutput {
                            job,
                            event: Event::Stdout { data },
                        });
                    }
                    for data in stderr {
                        events.push(RuntimeEvent::JobOutput {
                            job,
                            event: Event::Stderr { data },
                        });
                    }
                    events.push(RuntimeEvent::JobExited { job, code });
                    self.send_later(events);
                }
                FakeOutcome::SpawnFail => {
                    self.send_later(vec![RuntimeEvent::SpawnFailed {
                        job,
                        reason: "No such file or directory (os error 2)".to_string(),
                    }]);
                }
                FakeOutcome::Hang => {
                    self.hanging = Some(job);
                }
            }
            Ok(())
        })
    }

    fn kill(&mut self, job: JobId) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.killed.lock().unwrap().push(job);

            if self.hanging == Some(job) {
                self.hanging = None;
                self.send_later(vec![RuntimeEvent::JobExited {
                    job,
                    code: FAKE_KILLED_CODE,
                }]);
            }
            Ok(())
        })
    }
}
