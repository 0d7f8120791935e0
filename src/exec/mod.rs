// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the requested commands,
//! using `tokio::process::Command`, and reporting back to the runtime via
//! `RuntimeEvent`s.
//!
//! - [`backend`] provides the `ProcessBackend` trait and the concrete
//!   `RealProcessBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.
//! - [`job_runner`] owns one child process from spawn to exit.
//! - [`stream`] relays a child pipe chunk by chunk.

pub mod backend;
pub mod job_runner;
pub mod stream;

pub use backend::{ProcessBackend, RealProcessBackend, DEFAULT_CHUNK_SIZE};
pub use job_runner::{exit_code, run_job};
pub use stream::{relay_stream, spawn_stream_relay, Utf8Chunker};
