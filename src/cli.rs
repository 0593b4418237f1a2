// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::ChangeKind;

/// Command-line arguments for `foundation`.
#[derive(Debug, Clone, Parser, Default)]
#[command(
    name = "foundation",
    version,
    about = "Watch paths for filesystem changes and react to them.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a config file (TOML).
    ///
    /// When omitted, `Foundation.toml` in the current directory is used if it
    /// exists; otherwise the configuration comes from flags only.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Path to watch (repeatable). Overrides `[observer].paths`.
    #[arg(long = "path", value_name = "PATH")]
    pub paths: Vec<String>,

    /// Include glob (repeatable), matched against paths relative to the
    /// watched root.
    #[arg(long, value_name = "GLOB")]
    pub include: Vec<String>,

    /// Exclude glob (repeatable).
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Change kind to report (create, modify, delete, move). Repeatable.
    #[arg(long = "kind", value_name = "KIND", value_parser = parse_kind)]
    pub kinds: Vec<ChangeKind>,

    /// Debounce window, e.g. `250ms` or `1s`.
    #[arg(long, value_name = "DURATION")]
    pub debounce: Option<String>,

    /// Force the polling backend instead of native notifications.
    #[arg(long)]
    pub poll: bool,

    /// Shell command to run for every processed change.
    #[arg(long, value_name = "CMD")]
    pub exec: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FOUNDATION_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the configuration, but don't start watching.
    #[arg(long)]
    pub dry_run: bool,
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

impl LogLevel {
    pub fn as_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn parse_kind(s: &str) -> Result<ChangeKind, String> {
    s.parse()
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
