// src/lib.rs

pub mod cli;
pub mod config;
pub mod emit;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod input;
pub mod logging;
pub mod protocol;
pub mod types;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::info;

use crate::cli::CliArgs;
use crate::config::{load_and_validate, ConfigFile};
use crate::emit::EventEmitter;
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::RelayError;
use crate::exec::RealProcessBackend;
use crate::input::spawn_input_reader;
use crate::types::InputClosePolicy;

/// Effective settings after merging defaults, config file and CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaySettings {
    pub on_input_close: InputClosePolicy,
    pub chunk_size: usize,
    pub channel_capacity: usize,
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the stdin request reader
/// - the process backend
/// - the core runtime and its IO shell writing to stdout
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = resolve_settings(&args)?;
    info!(?settings, "cmdrelay starting");

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(settings.channel_capacity);

    let backend = RealProcessBackend::with_chunk_size(rt_tx.clone(), settings.chunk_size);

    let _reader = spawn_input_reader(tokio::io::stdin(), rt_tx.clone());

    // Ctrl-C → cancel everything and stop once exits are reported.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let options = RuntimeOptions {
        on_input_close: settings.on_input_close,
    };

    let core = CoreRuntime::new(options);
    let runtime = Runtime::new(core, rt_rx, backend, EventEmitter::stdout());
    runtime.run().await?;

    Ok(())
}

/// Merge defaults, the optional config file and CLI overrides.
pub fn resolve_settings(args: &CliArgs) -> Result<RelaySettings> {
    let cfg = match args.config {
        Some(ref path) => load_and_validate(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => ConfigFile::default(),
    };

    let relay = cfg.relay();
    let settings = RelaySettings {
        on_input_close: args.on_input_close.unwrap_or(relay.on_input_close),
        chunk_size: args.chunk_size.unwrap_or(relay.chunk_size),
        channel_capacity: relay.channel_capacity,
    };

    if settings.chunk_size == 0 {
        return Err(RelayError::ConfigError("--chunk-size must be >= 1 (got 0)".to_string()).into());
    }

    Ok(settings)
}
