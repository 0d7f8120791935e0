#![allow(dead_code)]

use cmdrelay::engine::RuntimeEvent;
use cmdrelay::protocol::{Request, RunRequest};

/// `RuntimeEvent` for a decoded run request.
pub fn run(command: &str, args: &[&str]) -> RuntimeEvent {
    RuntimeEvent::Request(Request::Run(RunRequest::new(command, args.iter().copied())))
}

/// `RuntimeEvent` for a decoded kill request.
pub fn kill() -> RuntimeEvent {
    RuntimeEvent::Request(Request::Kill)
}

/// Wire-format line for a run request (with trailing newline).
pub fn run_line(command: &str, args: &[&str]) -> String {
    let value = serde_json::json!({ "command": command, "args": args });
    format!("{value}\n")
}

/// Wire-format line for a kill request (with trailing newline).
pub fn kill_line() -> String {
    "{\"type\":\"kill\"}\n".to_string()
}

/// Concatenate wire lines into one input buffer.
pub fn input_of<I, S>(lines: I) -> Vec<u8>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .flat_map(|l| l.as_ref().as_bytes().to_vec())
        .collect()
}
