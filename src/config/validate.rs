// src/config/validate.rs

use crate::build::rules::compile_pattern;
use crate::config::model::{Pullfile, RawPullfile};
use crate::errors::{PullbuildError, Result};
use crate::exec::template;

impl TryFrom<RawPullfile> for Pullfile {
    type Error = PullbuildError;

    fn try_from(raw: RawPullfile) -> std::result::Result<Self, Self::Error> {
        validate_raw_pullfile(&raw)?;
        Ok(Pullfile::new_unchecked(raw.config, raw.rule))
    }
}

/// Run all checks on a raw Pullfile without consuming it.
pub fn validate_pullfile(raw: &RawPullfile) -> Result<()> {
    validate_raw_pullfile(raw)
}

fn validate_raw_pullfile(cfg: &RawPullfile) -> Result<()> {
    ensure_has_rules(cfg)?;
    validate_global_config(cfg)?;
    validate_patterns(cfg)?;
    validate_placeholders(cfg)?;
    Ok(())
}

fn ensure_has_rules(cfg: &RawPullfile) -> Result<()> {
    if cfg.rule.is_empty() {
        return Err(PullbuildError::ConfigError(
            "Pullfile must contain at least one [[rule]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawPullfile) -> Result<()> {
    if cfg.config.jobs == Some(0) {
        return Err(PullbuildError::ConfigError(
            "[config].jobs must be >= 1 (got 0)".to_string(),
        ));
    }

    if let (Some(jobs), Some(max_threads)) = (cfg.config.jobs, cfg.config.max_threads) {
        if max_threads < jobs {
            return Err(PullbuildError::ConfigError(format!(
                "[config].max_threads ({max_threads}) must be >= jobs ({jobs})"
            )));
        }
    }

    if cfg.config.max_threads == Some(0) {
        return Err(PullbuildError::ConfigError(
            "[config].max_threads must be >= 1 (got 0)".to_string(),
        ));
    }

    if let Some(target) = &cfg.config.default_target {
        if target.trim().is_empty() {
            return Err(PullbuildError::ConfigError(
                "[config].default_target must not be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Unlike `Build::rule`, a Pullfile rejects malformed globs at load time.
fn validate_patterns(cfg: &RawPullfile) -> Result<()> {
    for (idx, rule) in cfg.rule.iter().enumerate() {
        if rule.pattern.trim().is_empty() {
            return Err(PullbuildError::ConfigError(format!(
                "rule #{} has an empty pattern",
                idx + 1
            )));
        }
        if let Err(err) = compile_pattern(&rule.pattern) {
            return Err(PullbuildError::ConfigError(format!(
                "rule '{}' has an invalid pattern: {err}",
                rule.pattern
            )));
        }
    }
    Ok(())
}

fn validate_placeholders(cfg: &RawPullfile) -> Result<()> {
    for rule in cfg.rule.iter() {
        let templates = rule.needs.iter().chain(rule.cmd.iter());
        for text in templates {
            if let Some(name) = template::unknown_placeholders(text).into_iter().next() {
                return Err(PullbuildError::ConfigError(format!(
                    "rule '{}' uses unknown placeholder '{{{name}}}' (expected one of {})",
                    rule.pattern,
                    template::PLACEHOLDERS.join(", ")
                )));
            }
        }
    }
    Ok(())
}
