// tests/binary_stdio.rs
//
// Drives the built `cmdrelay` binary over real stdin/stdout pipes.
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use cmdrelay::protocol::Event;
use cmdrelay::types::SPAWN_FAILURE_CODE;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn binary_relays_jobs_from_stdin_and_exits_after_drain() -> TestResult {
    init_tracing();

    let mut child = Command::new(env!("CARGO_BIN_EXE_cmdrelay"))
        .env("CMDRELAY_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let input = concat!(
        "not json\n",
        "{\"command\":\"echo\",\"args\":[\"hi\"]}\n",
        "\n",
        "{\"type\":\"run\",\"command\":\"sh\",\"args\":[\"-c\",\"exit 3\"]}\n",
        "{\"command\":\"\",\"args\":[]}\n",
    );

    let mut stdin = child.stdin.take().expect("stdin not piped");
    stdin.write_all(input.as_bytes()).await?;
    // Closing stdin lets the relay drain the queue and exit.
    drop(stdin);

    let output = with_timeout(child.wait_with_output()).await?;
    assert!(output.status.success(), "exit status: {:?}", output.status);

    let stdout = String::from_utf8(output.stdout)?;
    let events = stdout
        .lines()
        .map(serde_json::from_str::<Event>)
        .collect::<Result<Vec<_>, _>>()?;

    assert_eq!(events.len(), 5, "events: {events:?}");
    match &events[0] {
        Event::Stderr { data } => assert!(data.starts_with("Error: invalid request:")),
        other => panic!("expected diagnostic first, got {other:?}"),
    }
    assert_eq!(
        events[1..],
        [
            Event::Stdout {
                data: "hi\n".to_string()
            },
            Event::Exit { code: 0 },
            Event::Exit { code: 3 },
            Event::Exit {
                code: SPAWN_FAILURE_CODE
            },
        ]
    );
    Ok(())
}
