// src/emit.rs

//! Newline-delimited JSON event writer.
//!
//! The emitter is the only thing that writes to the output stream. It is
//! owned by the runtime loop, so events leave in exactly the order the core
//! produced them.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::errors::Result;
use crate::protocol::Event;

pub struct EventEmitter<W> {
    writer: W,
    written: u64,
}

impl<W> std::fmt::Debug for EventEmitter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}

impl EventEmitter<tokio::io::Stdout> {
    /// Emitter bound to the process's stdout.
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> EventEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Serialize `event` as one JSON line and flush it.
    ///
    /// Flushing per record keeps the orchestrator in step with the child
    /// instead of waiting for a buffer to fill.
    pub async fn emit(&mut self, event: &Event) -> Result<()> {
        let mut line = event.to_json()?;
        line.push('\n');

        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        self.written += 1;

        trace!(seq = self.written, %line, "event emitted");
        Ok(())
    }

    /// Number of events written so far.
    pub fn events_written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
