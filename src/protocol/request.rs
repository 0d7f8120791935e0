// src/protocol/request.rs

//! Inbound request decoding.

use serde_json::Value;
use thiserror::Error;

/// Instruction to run one external command.
///
/// `cancelled` is not part of the wire format. It is flipped by the job queue
/// when a kill arrives while this request is still pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub command: String,
    pub args: Vec<String>,
    pub cancelled: bool,
}

impl RunRequest {
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            cancelled: false,
        }
    }

    /// Human-readable rendering for logs.
    pub fn display_cmd(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

/// A decoded input record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Run(RunRequest),
    Kill,
}

/// Why an input record was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("record is not valid UTF-8")]
    InvalidUtf8,

    #[error("malformed JSON: {0}")]
    InvalidJson(String),

    #[error("record must be a JSON object")]
    NotAnObject,

    #[error("missing \"command\" string")]
    MissingCommand,

    #[error("invalid \"args\": {0}")]
    InvalidArgs(String),
}

/// Decode one raw input line.
///
/// Returns `None` for blank lines, which are skipped without a diagnostic.
/// A trailing `\r` is stripped so CRLF input works too.
pub fn decode_record(raw: &[u8]) -> Option<Result<Request, DecodeError>> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

    let record = match std::str::from_utf8(raw) {
        Ok(s) => s,
        Err(_) => return Some(Err(DecodeError::InvalidUtf8)),
    };

    if record.trim().is_empty() {
        return None;
    }

    Some(decode_request(record))
}

/// Parse a single JSON record into a [`Request`].
///
/// - `{"type": "kill"}` is a kill, whatever else the object carries.
/// - Anything else is a run request: it must carry a `command` string and,
///   if present, an `args` array of strings. Other `type` values are
///   ignored. An empty `command` is accepted and fails at spawn time, so it
///   still gets its exit event.
pub fn decode_request(record: &str) -> Result<Request, DecodeError> {
    let value: Value =
        serde_json::from_str(record).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

    let obj = value.as_object().ok_or(DecodeError::NotAnObject)?;

    if obj.get("type").and_then(Value::as_str) == Some("kill") {
        return Ok(Request::Kill);
    }

    let command = match obj.get("command") {
        Some(Value::String(s)) => s.clone(),
        _ => return Err(DecodeError::MissingCommand),
    };

    let args = match obj.get("args") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| DecodeError::InvalidArgs(format!("args[{idx}] is not a string")))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(DecodeError::InvalidArgs(
                "expected an array of strings".to_string(),
            ));
        }
    };

    Ok(Request::Run(RunRequest {
        command,
        args,
        cancelled: false,
    }))
}
