// src/protocol/mod.rs

//! Wire protocol spoken over stdin/stdout.
//!
//! Both directions are newline-delimited JSON:
//! - [`request`] decodes inbound records into typed [`Request`]s.
//! - [`event`] defines the outbound [`Event`] records.

pub mod event;
pub mod request;

pub use event::{Event, OutputStream};
pub use request::{decode_record, decode_request, DecodeError, Request, RunRequest};
