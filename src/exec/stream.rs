// src/exec/stream.rs

//! Chunked relay of a child pipe into the runtime channel.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use crate::engine::{JobId, RuntimeEvent};
use crate::protocol::{Event, OutputStream};

/// Incremental UTF-8 decoder for pipe chunks.
///
/// A multi-byte sequence split across two reads is held back until its
/// remaining bytes arrive. Bytes that can never form valid UTF-8 become
/// U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Chunker {
    pending: Vec<u8>,
}

impl Utf8Chunker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns whatever text is complete so far.
    pub fn push(&mut self, bytes: &[u8]) -> Option<String> {
        self.pending.extend_from_slice(bytes);

        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    out.push_str(std::str::from_utf8(&self.pending[..valid]).unwrap_or_default());
                    match err.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            // Incomplete trailing sequence.
                            self.pending.drain(..valid);
                            break;
                        }
                    }
                }
            }
        }

        if out.is_empty() { None } else { Some(out) }
    }

    /// Flush any held-back bytes at EOF.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(text)
    }
}

/// Spawn a task forwarding `reader` to the runtime as `stream` events.
///
/// Returns `None` if the pipe was not captured.
pub fn spawn_stream_relay<R>(
    job: JobId,
    stream: OutputStream,
    reader: Option<R>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    chunk_size: usize,
) -> Option<JoinHandle<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(reader) = reader else {
        warn!(job_id = %job, stream = stream.as_str(), "pipe not captured; nothing to relay");
        return None;
    };

    Some(tokio::spawn(relay_stream(
        job, stream, reader, runtime_tx, chunk_size,
    )))
}

/// Read `reader` until EOF, sending each decoded chunk as it arrives.
///
/// A read error is reported as a `stderr` event and ends the relay; the job
/// itself carries on to its exit.
pub async fn relay_stream<R>(
    job: JobId,
    stream: OutputStream,
    mut reader: R,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    chunk_size: usize,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut chunker = Utf8Chunker::new();

    loop {
        let event = match reader.read(&mut buf).await {
            Ok(0) => {
                if let Some(rest) = chunker.finish() {
                    forward(&runtime_tx, job, stream.event(rest)).await;
                }
                break;
            }
            Ok(n) => {
                trace!(job_id = %job, stream = stream.as_str(), bytes = n, "read chunk");
                match chunker.push(&buf[..n]) {
                    Some(text) => stream.event(text),
                    None => continue,
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!(job_id = %job, stream = stream.as_str(), error = %err, "error reading child output");
                forward(&runtime_tx, job, Event::error(&err)).await;
                break;
            }
        };

        if !forward(&runtime_tx, job, event).await {
            break;
        }
    }
}

async fn forward(runtime_tx: &mpsc::Sender<RuntimeEvent>, job: JobId, event: Event) -> bool {
    runtime_tx
        .send(RuntimeEvent::JobOutput { job, event })
        .await
        .is_ok()
}
