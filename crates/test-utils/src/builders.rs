#![allow(dead_code)]

use pullbuild::config::{ConfigSection, Pullfile, RawPullfile, RuleConfig};

/// Builder for `Pullfile` to simplify test setup.
pub struct PullfileBuilder {
    pullfile: RawPullfile,
}

impl PullfileBuilder {
    pub fn new() -> Self {
        Self {
            pullfile: RawPullfile {
                config: ConfigSection::default(),
                rule: Vec::new(),
            },
        }
    }

    pub fn with_rule(mut self, rule: RuleConfig) -> Self {
        self.pullfile.rule.push(rule);
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.pullfile.config.jobs = Some(jobs);
        self
    }

    pub fn max_threads(mut self, max_threads: usize) -> Self {
        self.pullfile.config.max_threads = Some(max_threads);
        self
    }

    pub fn default_target(mut self, target: &str) -> Self {
        self.pullfile.config.default_target = Some(target.to_string());
        self
    }

    /// The raw form, for tests that exercise validation failures.
    pub fn raw(self) -> RawPullfile {
        self.pullfile
    }

    pub fn build(self) -> Pullfile {
        Pullfile::try_from(self.pullfile).expect("Failed to build valid Pullfile from builder")
    }
}

impl Default for PullfileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RuleConfig`.
pub struct RuleConfigBuilder {
    rule: RuleConfig,
}

impl RuleConfigBuilder {
    pub fn new(pattern: &str) -> Self {
        Self {
            rule: RuleConfig::new(pattern),
        }
    }

    pub fn needs(mut self, target: &str) -> Self {
        self.rule.needs.push(target.to_string());
        self
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.rule.cmd = Some(cmd.to_string());
        self
    }

    pub fn build(self) -> RuleConfig {
        self.rule
    }
}
