use std::fmt;

/// Name of a unit of schedulable work, e.g. `"fetch_feeds"` or
/// `"copy_assets:style.css"`.
///
/// The scheduler treats targets as opaque strings. Any structure (such as the
/// `namespace:argument` convention) belongs to rule authors.
pub type Target = String;

/// Public, read-only view of where a target is in its lifecycle.
///
/// A target moves `Unknown -> Building -> {Done | Failed}` exactly once per
/// [`Build`](crate::build::Build); the terminal states are permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetState {
    /// Never demanded.
    Unknown,
    /// A handler is queued or currently executing for this target.
    Building,
    /// The handler completed without error.
    Done,
    /// The handler failed; the error is kept for replay.
    Failed,
}

impl TargetState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TargetState::Done | TargetState::Failed)
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TargetState::Unknown => "unknown",
            TargetState::Building => "building",
            TargetState::Done => "done",
            TargetState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Counts of targets per state, as reported after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub done: usize,
    pub failed: usize,
    pub building: usize,
}

impl BuildSummary {
    /// Total number of targets that were demanded at least once.
    pub fn total(&self) -> usize {
        self.done + self.failed + self.building
    }
}
