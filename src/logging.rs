// src/logging.rs

//! Logging setup for `pullbuild` using `tracing` + `tracing-subscriber`.
//!
//! The filter comes from, in order:
//! 1. `--log-level` (a single global level),
//! 2. `PULLBUILD_LOG`, which takes full `EnvFilter` directives such as
//!    `info,pullbuild::build=debug`,
//! 3. `info`.
//!
//! Logs go to stderr so command stdout stays clean.

use anyhow::Result;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV: &str = "PULLBUILD_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();

    // Rule handlers run on named pool threads; show which one logged.
    fmt()
        .with_env_filter(build_filter(cli_level, env.as_deref()))
        .with_target(true)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install log subscriber: {err}"))?;

    Ok(())
}

/// Unparsable `env` directives fall back to `info` rather than failing
/// startup.
fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        let level = LevelFilter::from_level(level.into());
        return EnvFilter::default().add_directive(level.into());
    }

    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(LevelFilter::INFO.into()))
}
