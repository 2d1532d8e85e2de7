use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::bail;
use pullbuild::exec::CommandRunner;

/// A fake command runner that:
/// - records every `(target, cmd)` it was asked to run, in call order
/// - fails targets listed via [`RecordingRunner::failing`].
#[derive(Debug, Default)]
pub struct RecordingRunner {
    executed: Mutex<Vec<(String, String)>>,
    failing: HashSet<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the command of `target` fail with a non-zero "exit".
    pub fn failing(mut self, target: &str) -> Self {
        self.failing.insert(target.to_string());
        self
    }

    /// `(target, cmd)` pairs in the order they ran.
    pub fn executed(&self) -> Vec<(String, String)> {
        self.executed.lock().unwrap().clone()
    }

    /// Just the commands, in the order they ran.
    pub fn commands(&self) -> Vec<String> {
        self.executed().into_iter().map(|(_, cmd)| cmd).collect()
    }

    /// Position of `target` in the execution order.
    pub fn position(&self, target: &str) -> Option<usize> {
        self.executed().iter().position(|(t, _)| t == target)
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, target: &str, cmd: &str) -> anyhow::Result<()> {
        self.executed
            .lock()
            .unwrap()
            .push((target.to_string(), cmd.to_string()));

        if self.failing.contains(target) {
            bail!("command `{cmd}` exited with code 1");
        }
        Ok(())
    }
}
