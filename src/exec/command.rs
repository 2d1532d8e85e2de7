// src/exec/command.rs

//! Shell command execution for rule commands.

use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Number of trailing stderr lines quoted in a failure message.
const STDERR_TAIL: usize = 5;

/// Run `cmd` through the platform shell on behalf of `target`.
///
/// Stdout is inherited so command output reaches the terminal untouched.
/// Stderr is logged line by line at debug, and its last lines are attached to
/// the error when the command exits unsuccessfully.
pub async fn run_shell(target: &str, cmd: &str, workdir: Option<&Path>) -> Result<()> {
    info!(name = %target, cmd = %cmd, "running command");

    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    if let Some(dir) = workdir {
        command.current_dir(dir);
    }

    command
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning command for target '{target}'"))?;

    let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL);
    if let Some(stderr) = child.stderr.take() {
        let mut lines = BufReader::new(stderr).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .with_context(|| format!("reading stderr of target '{target}'"))?
        {
            debug!(name = %target, "stderr: {}", line);
            if tail.len() == STDERR_TAIL {
                tail.pop_front();
            }
            tail.push_back(line);
        }
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for command of target '{target}'"))?;

    let code = status.code().unwrap_or(-1);
    if status.success() {
        debug!(name = %target, exit_code = code, "command finished");
        return Ok(());
    }

    warn!(name = %target, exit_code = code, "command failed");
    if tail.is_empty() {
        bail!("command `{cmd}` exited with code {code}");
    }
    let stderr = Vec::from(tail).join("\n");
    bail!("command `{cmd}` exited with code {code}:\n{stderr}");
}
