// src/exec/backend.rs

//! Pluggable command runner.
//!
//! Pullfile rule handlers talk to a `CommandRunner` instead of spawning
//! processes themselves. This keeps the scheduler tests free of real
//! processes:
//!
//! - `ShellRunner` is the implementation the `pullbuild` binary uses.
//! - Tests can provide their own runner that, for example, records which
//!   commands were requested and fails selected targets.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::runtime::Handle;

use super::command::run_shell;

/// Executes the (already expanded) command of a rule.
///
/// Called from pool threads, possibly from several at once.
pub trait CommandRunner: Send + Sync {
    fn run(&self, target: &str, cmd: &str) -> Result<()>;
}

/// Runs commands through `sh -c` (`cmd /C` on Windows).
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    workdir: Option<PathBuf>,
}

impl ShellRunner {
    /// Runner executing commands in `workdir` (the current directory if
    /// `None`).
    pub fn new(workdir: Option<PathBuf>) -> Self {
        Self { workdir }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, target: &str, cmd: &str) -> Result<()> {
        // Pool threads belong to the build's runtime, which also drives
        // process reaping.
        let handle = Handle::try_current()
            .context("shell commands must run on a build worker thread")?;
        handle.block_on(run_shell(target, cmd, self.workdir.as_deref()))
    }
}
