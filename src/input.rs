// src/input.rs

//! Input stream reader.
//!
//! Splits the input into newline-delimited records, decodes each one and
//! forwards the result to the runtime in arrival order. EOF (or a read
//! error) is reported once as `RuntimeEvent::InputClosed`.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::protocol::decode_record;

/// Spawn the reader task for `input`.
pub fn spawn_input_reader<R>(input: R, runtime_tx: mpsc::Sender<RuntimeEvent>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(read_requests(input, runtime_tx))
}

/// Read records from `input` until EOF.
pub async fn read_requests<R>(input: R, runtime_tx: mpsc::Sender<RuntimeEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(input);
    let mut line = Vec::new();
    let mut records = 0u64;

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "failed reading input stream; treating as closed");
                break;
            }
        }

        let raw = line.strip_suffix(b"\n").unwrap_or(&line);
        let event = match decode_record(raw) {
            None => continue,
            Some(Ok(request)) => RuntimeEvent::Request(request),
            Some(Err(err)) => RuntimeEvent::Malformed(err),
        };

        records += 1;
        debug!(records, ?event, "decoded input record");

        if runtime_tx.send(event).await.is_err() {
            debug!("runtime gone; stopping input reader");
            return;
        }
    }

    info!(records, "input stream closed");
    let _ = runtime_tx.send(RuntimeEvent::InputClosed).await;
}
