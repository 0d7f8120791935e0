use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;

/// Exit code reported when a command could not be spawned at all.
pub const SPAWN_FAILURE_CODE: i32 = 127;

/// Exit code reported for a job that was cancelled before it started.
pub const CANCELLED_CODE: i32 = 500;

/// Exit code reported when the OS gives us neither a code nor a signal.
pub const UNKNOWN_EXIT_CODE: i32 = -1;

/// What to do with queued and running jobs once the input stream closes.
///
/// - `Drain`: keep going until every queued job has produced its exit event
///   (default behaviour).
/// - `Kill`: cancel everything still pending, kill the running child, and
///   stop as soon as the resulting exit events are out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputClosePolicy {
    Drain,
    Kill,
}

impl Default for InputClosePolicy {
    fn default() -> Self {
        InputClosePolicy::Drain
    }
}

impl FromStr for InputClosePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drain" => Ok(InputClosePolicy::Drain),
            "kill" => Ok(InputClosePolicy::Kill),
            other => Err(format!(
                "invalid on_input_close: {other} (expected \"drain\" or \"kill\")"
            )),
        }
    }
}
