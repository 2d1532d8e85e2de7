// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::config::DEFAULT_PULLFILE;

/// Command-line arguments for `pullbuild`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pullbuild",
    version,
    about = "Build targets on demand from glob rules in a Pullfile.",
    long_about = None
)]
pub struct CliArgs {
    /// Target to build.
    ///
    /// Defaults to `[config].default_target` from the Pullfile.
    #[arg(value_name = "TARGET")]
    pub target: Option<String>,

    /// Path to the Pullfile (TOML).
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_PULLFILE)]
    pub file: String,

    /// Maximum number of rule commands running at once.
    ///
    /// Overrides `[config].jobs`; defaults to the number of CPUs.
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PULLBUILD_LOG` directives or `info` are used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the rules in lookup order, run nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the discovered dependency graph (Graphviz DOT) after the build.
    #[arg(long)]
    pub graph: bool,
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

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
