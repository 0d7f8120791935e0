// tests/process_runner.rs
//
// These tests spawn real processes and rely on POSIX utilities.
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, run_scripted, with_timeout};

use std::error::Error;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use cmdrelay::engine::{JobId, RuntimeEvent, RuntimeOptions};
use cmdrelay::exec::{run_job, RealProcessBackend};
use cmdrelay::protocol::{decode_request, Event, Request, RunRequest};
use cmdrelay::types::{CANCELLED_CODE, SPAWN_FAILURE_CODE};
use cmdrelay_test_utils::builders::{kill, run};

type TestResult = Result<(), Box<dyn Error>>;

/// Collect everything a single `run_job` reports.
async fn run_single(request: RunRequest) -> Vec<RuntimeEvent> {
    let (tx, mut rx) = mpsc::channel(64);
    let (_cancel_tx, cancel_rx) = oneshot::channel();

    with_timeout(run_job(JobId(1), request, tx, cancel_rx, 4096)).await;

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn stdout_of(events: &[Event]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Stdout { data } => Some(data.as_str()),
            _ => None,
        })
        .collect()
}

fn stderr_of(events: &[Event]) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Stderr { data } => Some(data.as_str()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn runner_relays_echo_and_exit_zero() -> TestResult {
    init_tracing();

    let events = run_single(RunRequest::new("echo", ["hi"])).await;

    let last = events.last().expect("no events");
    assert!(matches!(last, RuntimeEvent::JobExited { job: JobId(1), code: 0 }));

    let output: String = events
        .iter()
        .filter_map(|e| match e {
            RuntimeEvent::JobOutput {
                event: Event::Stdout { data },
                ..
            } => Some(data.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(output, "hi\n");
    Ok(())
}

#[tokio::test]
async fn runner_reports_spawn_failure_only() -> TestResult {
    init_tracing();

    let events = run_single(RunRequest::new("/no/such/binary", Vec::<String>::new())).await;

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], RuntimeEvent::SpawnFailed { job: JobId(1), .. }));
    Ok(())
}

#[tokio::test]
async fn runner_never_spawns_a_cancelled_request() -> TestResult {
    init_tracing();

    let mut request = RunRequest::new("sh", ["-c", "echo should-not-run"]);
    request.cancelled = true;

    let events = run_single(request).await;
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        RuntimeEvent::JobExited { code: CANCELLED_CODE, .. }
    ));
    Ok(())
}

#[tokio::test]
async fn runner_reports_non_zero_exit_and_stderr() -> TestResult {
    init_tracing();

    let events = run_single(RunRequest::new("sh", ["-c", "echo oops >&2; exit 3"])).await;

    assert!(matches!(
        events.last(),
        Some(RuntimeEvent::JobExited { code: 3, .. })
    ));
    let stderr: String = events
        .iter()
        .filter_map(|e| match e {
            RuntimeEvent::JobOutput {
                event: Event::Stderr { data },
                ..
            } => Some(data.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(stderr, "oops\n");
    Ok(())
}

#[tokio::test]
async fn killed_runner_reports_signal_code() -> TestResult {
    init_tracing();

    let (tx, mut rx) = mpsc::channel(64);
    let (cancel_tx, cancel_rx) = oneshot::channel();

    let handle = tokio::spawn(run_job(
        JobId(9),
        RunRequest::new("sleep", ["30"]),
        tx,
        cancel_rx,
        4096,
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel_tx.send(()).expect("runner gone before kill");
    with_timeout(handle).await?;

    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        last = Some(event);
    }
    // SIGKILL under the 128 + signal convention.
    assert!(matches!(
        last,
        Some(RuntimeEvent::JobExited { job: JobId(9), code: 137 })
    ));
    Ok(())
}

#[tokio::test]
async fn end_to_end_scenarios_through_real_backend() -> TestResult {
    init_tracing();

    let out = run_scripted(
        RuntimeOptions::default(),
        vec![
            run("echo", &["hi"]),
            run("/no/such/binary", &[]),
            run("sh", &["-c", "printf out; printf err >&2; exit 4"]),
            RuntimeEvent::InputClosed,
        ],
        RealProcessBackend::new,
    )
    .await;

    let events = out.events();
    assert_eq!(out.exit_codes(), vec![0, SPAWN_FAILURE_CODE, 4]);

    // Split the event stream per job at each exit.
    let jobs: Vec<Vec<Event>> = events
        .split_inclusive(|e| e.is_terminal())
        .map(|s| s.to_vec())
        .collect();
    assert_eq!(jobs.len(), 3);

    assert_eq!(stdout_of(&jobs[0]), "hi\n");
    assert_eq!(jobs[1], vec![Event::Exit { code: SPAWN_FAILURE_CODE }]);
    assert_eq!(stdout_of(&jobs[2]), "out");
    assert_eq!(stderr_of(&jobs[2]), "err");
    Ok(())
}

#[tokio::test]
async fn kill_terminates_long_job_and_queue_moves_on() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let backend = RealProcessBackend::new(rt_tx.clone());
    let out = cmdrelay_test_utils::buffer::SharedBuffer::new();
    let runtime = cmdrelay::engine::Runtime::new(
        cmdrelay::engine::CoreRuntime::new(RuntimeOptions::default()),
        rt_rx,
        backend,
        cmdrelay::emit::EventEmitter::new(out.clone()),
    );
    let runtime = tokio::spawn(runtime.run());

    rt_tx.send(run("sleep", &["30"])).await?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    rt_tx.send(kill()).await?;
    rt_tx.send(run("echo", &["after"])).await?;
    rt_tx.send(RuntimeEvent::InputClosed).await?;

    with_timeout(runtime).await??;

    let events = out.events();
    assert_eq!(
        events,
        vec![
            Event::Exit { code: 137 },
            Event::Stdout {
                data: "after\n".to_string()
            },
            Event::Exit { code: 0 },
        ]
    );
    Ok(())
}

#[tokio::test]
async fn empty_command_reports_spawn_failure_exit() -> TestResult {
    init_tracing();

    let request = match decode_request(r#"{"command":"","args":[]}"#)? {
        Request::Run(run) => run,
        Request::Kill => panic!("expected run request"),
    };

    let out = run_scripted(
        RuntimeOptions::default(),
        vec![
            RuntimeEvent::Request(Request::Run(request)),
            run("echo", &["next"]),
            RuntimeEvent::InputClosed,
        ],
        RealProcessBackend::new,
    )
    .await;

    assert_eq!(
        out.events(),
        vec![
            Event::Exit {
                code: SPAWN_FAILURE_CODE
            },
            Event::Stdout {
                data: "next\n".to_string()
            },
            Event::Exit { code: 0 },
        ]
    );
    Ok(())
}
