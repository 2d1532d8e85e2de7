// src/errors.rs

//! Crate-wide error types.
//!
//! - [`BuildError`] is what the scheduler hands back from `need` / `run`.
//!   It is `Clone` so a failure can be stored once and replayed to every
//!   caller that later demands the same target.
//! - [`PullbuildError`] covers the Pullfile front-end (config, IO, TOML).

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

use crate::types::Target;

#[derive(Error, Debug, Clone)]
pub enum BuildError {
    #[error("no rule matches target: {target}")]
    NoMatchingRule { target: Target },

    #[error("target '{target}' failed: {error:#}")]
    HandlerFailed {
        target: Target,
        error: Arc<anyhow::Error>,
    },

    #[error("dependency cycle detected: {}", .cycle.join(" -> "))]
    DependencyCycle { cycle: Vec<Target> },

    #[error("target '{target}' was abandoned before it finished")]
    Abandoned { target: Target },

    #[error("need() called while no build is running")]
    NotRunning,

    #[error("a build is already running on this scheduler")]
    AlreadyRunning,

    #[error("failed to start worker pool: {0}")]
    PoolStartup(#[source] Arc<std::io::Error>),
}

impl BuildError {
    /// Convert the error returned by a rule handler into the value stored for
    /// `target`.
    ///
    /// A `BuildError` coming out of a handler (usually a dependency failure
    /// forwarded with `?`) is kept as-is, so the original failure is what
    /// every caller up the graph observes. The downcast also sees through
    /// `.context(...)`, so context a handler adds on top of a forwarded
    /// `BuildError` is dropped.
    pub(crate) fn from_handler(target: &str, err: anyhow::Error) -> Self {
        match err.downcast::<BuildError>() {
            Ok(build_err) => build_err,
            Err(err) => BuildError::HandlerFailed {
                target: target.to_string(),
                error: Arc::new(err),
            },
        }
    }

    pub(crate) fn from_panic(target: &str, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };

        BuildError::HandlerFailed {
            target: target.to_string(),
            error: Arc::new(anyhow::anyhow!("handler panicked: {message}")),
        }
    }

    /// The target this error is attributed to, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            BuildError::NoMatchingRule { target }
            | BuildError::HandlerFailed { target, .. }
            | BuildError::Abandoned { target } => Some(target.as_str()),
            BuildError::DependencyCycle { cycle } => cycle.first().map(String::as_str),
            _ => None,
        }
    }
}

/// Two handler failures are equal only if they are the very same stored
/// failure, so a replayed error compares equal to the original.
impl PartialEq for BuildError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                BuildError::NoMatchingRule { target: a },
                BuildError::NoMatchingRule { target: b },
            ) => a == b,
            (
                BuildError::HandlerFailed { target: a, error: ea },
                BuildError::HandlerFailed { target: b, error: eb },
            ) => a == b && Arc::ptr_eq(ea, eb),
            (
                BuildError::DependencyCycle { cycle: a },
                BuildError::DependencyCycle { cycle: b },
            ) => a == b,
            (BuildError::Abandoned { target: a }, BuildError::Abandoned { target: b }) => a == b,
            (BuildError::NotRunning, BuildError::NotRunning) => true,
            (BuildError::AlreadyRunning, BuildError::AlreadyRunning) => true,
            (BuildError::PoolStartup(a), BuildError::PoolStartup(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum PullbuildError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PullbuildError>;
