#![allow(dead_code)]

use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use cmdrelay::emit::EventEmitter;
use cmdrelay::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use cmdrelay::exec::ProcessBackend;
use cmdrelay_test_utils::buffer::SharedBuffer;

pub use cmdrelay_test_utils::{init_tracing, with_timeout};

/// Feed `events` into a fresh runtime driving `backend`, wait for it to stop
/// and return everything it wrote.
///
/// The caller builds the backend from the returned sender so both share one
/// channel, mirroring how `cmdrelay::run` wires things.
pub async fn run_scripted<B, F>(
    options: RuntimeOptions,
    events: Vec<RuntimeEvent>,
    make_backend: F,
) -> SharedBuffer
where
    B: ProcessBackend,
    F: FnOnce(mpsc::Sender<RuntimeEvent>) -> B,
{
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let backend = make_backend(rt_tx.clone());

    for event in events {
        rt_tx.send(event).await.expect("runtime channel closed early");
    }

    let out = SharedBuffer::new();
    let runtime = Runtime::new(
        CoreRuntime::new(options),
        rt_rx,
        backend,
        EventEmitter::new(out.clone()),
    );

    match timeout(Duration::from_secs(5), runtime.run()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => panic!("runtime failed: {e}"),
        Err(_) => panic!("runtime did not finish within 5 seconds"),
    }

    out
}
