// src/config/model.rs

use serde::Deserialize;

use crate::build::BuildOptions;

/// Pullfile exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [config]
/// jobs = 4
/// default_target = "all"
///
/// [[rule]]
/// pattern = "all"
/// needs = ["copy_assets:style.css"]
///
/// [[rule]]
/// pattern = "copy_assets:*"
/// cmd = "cp assets/{arg} _site/{arg}"
/// ```
///
/// Rules are an array of tables so that file order is lookup order.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPullfile {
    /// Global settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All `[[rule]]` entries, in file order.
    #[serde(default)]
    pub rule: Vec<RuleConfig>,
}

/// A validated Pullfile. Obtain one via `Pullfile::try_from(raw)` or
/// [`load_and_validate`](crate::config::load_and_validate).
#[derive(Debug, Clone)]
pub struct Pullfile {
    config: ConfigSection,
    rules: Vec<RuleConfig>,
}

impl Pullfile {
    pub(crate) fn new_unchecked(config: ConfigSection, rules: Vec<RuleConfig>) -> Self {
        Self { config, rules }
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    /// Rules in lookup order.
    pub fn rules(&self) -> &[RuleConfig] {
        &self.rules
    }
}

/// `[config]` section. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of rule commands running at once.
    ///
    /// Defaults to the host's available parallelism.
    #[serde(default)]
    pub jobs: Option<usize>,

    /// Upper bound on worker threads, including ones blocked waiting for
    /// dependencies.
    #[serde(default)]
    pub max_threads: Option<usize>,

    /// Target built when none is given on the command line.
    #[serde(default)]
    pub default_target: Option<String>,
}

impl ConfigSection {
    /// Pool sizing, falling back to [`BuildOptions::default`].
    pub fn build_options(&self) -> BuildOptions {
        let mut options = BuildOptions::default();
        if let Some(jobs) = self.jobs {
            options = options.with_jobs(jobs);
        }
        if let Some(max_threads) = self.max_threads {
            options = options.with_max_threads(max_threads);
        }
        options
    }
}

/// One `[[rule]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    /// Glob matched against target names (`*`, `?`, `[...]`).
    pub pattern: String,

    /// Targets to build before `cmd` runs. Placeholders are expanded against
    /// the matched target.
    #[serde(default)]
    pub needs: Vec<String>,

    /// Shell command to run once `needs` are built. A rule without a command
    /// only aggregates its needs.
    #[serde(default)]
    pub cmd: Option<String>,
}

impl RuleConfig {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            needs: Vec::new(),
            cmd: None,
        }
    }
}
