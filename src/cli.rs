// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::InputClosePolicy;

/// Command-line arguments for `cmdrelay`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "cmdrelay",
    version,
    about = "Run commands requested as JSON lines on stdin, relaying their output as JSON events on stdout.",
    long_about = None
)]
pub struct CliArgs {
    /// Optional config file (TOML) with a `[relay]` section.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CMDRELAY_LOG` or a default level will be used. Logs
    /// always go to stderr.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// What to do with queued jobs once stdin closes.
    ///
    /// Overrides `[relay].on_input_close`.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub on_input_close: Option<InputClosePolicy>,

    /// Bytes read from a child pipe per output event.
    ///
    /// Overrides `[relay].chunk_size`.
    #[arg(long, value_name = "BYTES")]
    pub chunk_size: Option<usize>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
