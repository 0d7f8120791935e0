use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use cmdrelay::protocol::Event;
use tokio::io::AsyncWrite;

/// In-memory `AsyncWrite` sink shared between the emitter and the test.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, as text.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock().unwrap()).into_owned()
    }

    /// Raw output lines, without their newlines.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Parse every written line back into an `Event`.
    pub fn events(&self) -> Vec<Event> {
        self.lines()
            .iter()
            .map(|line| serde_json::from_str(line).expect("emitted line is not a valid event"))
            .collect()
    }

    /// Only the exit codes, in emission order.
    pub fn exit_codes(&self) -> Vec<i32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Exit { code } => Some(code),
                _ => None,
            })
            .collect()
    }
}

impl AsyncWrite for SharedBuffer {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.inner.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
