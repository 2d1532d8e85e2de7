// src/build/state.rs

//! Per-target state bookkeeping for a single [`Build`](crate::build::Build).
//!
//! Everything here is accessed under the scheduler lock; the types do no
//! synchronization of their own.

use std::collections::{HashMap, HashSet};

use tokio::sync::watch;

use crate::errors::BuildError;
use crate::types::{BuildSummary, Target, TargetState};

/// Final result of building one target.
pub(crate) type Outcome = Result<(), BuildError>;

/// Shared, awaitable handle for an in-flight build. Holds `None` until the
/// handler finishes.
pub(crate) type Completion = watch::Receiver<Option<Outcome>>;

/// Publishing side of a [`Completion`], owned by the job running the handler.
pub(crate) type CompletionSender = watch::Sender<Option<Outcome>>;

/// What a demander finds when it looks a target up.
#[derive(Debug)]
pub(crate) enum Lookup {
    Unknown,
    Building(Completion),
    Done,
    Failed(BuildError),
}

#[derive(Debug, Default)]
pub(crate) struct TargetTable {
    building: HashMap<Target, Completion>,
    done: HashSet<Target>,
    failed: HashMap<Target, BuildError>,
    /// Targets each building target is currently blocked on inside `need`.
    waits_for: HashMap<Target, Vec<Target>>,
}

impl TargetTable {
    pub(crate) fn lookup(&self, target: &str) -> Lookup {
        if let Some(err) = self.failed.get(target) {
            return Lookup::Failed(err.clone());
        }
        if self.done.contains(target) {
            return Lookup::Done;
        }
        match self.building.get(target) {
            Some(completion) => Lookup::Building(completion.clone()),
            None => Lookup::Unknown,
        }
    }

    /// Move `target` from unknown to building.
    pub(crate) fn start(&mut self, target: &str) -> (CompletionSender, Completion) {
        let (tx, rx) = watch::channel(None);
        self.building.insert(target.to_string(), rx.clone());
        (tx, rx)
    }

    /// Move `target` from building to its terminal state in one step.
    pub(crate) fn finish(&mut self, target: &str, outcome: &Outcome) {
        self.building.remove(target);
        self.waits_for.remove(target);
        match outcome {
            Ok(()) => {
                self.done.insert(target.to_string());
            }
            Err(err) => {
                self.failed.insert(target.to_string(), err.clone());
            }
        }
    }

    pub(crate) fn state_of(&self, target: &str) -> TargetState {
        if self.failed.contains_key(target) {
            TargetState::Failed
        } else if self.done.contains(target) {
            TargetState::Done
        } else if self.building.contains_key(target) {
            TargetState::Building
        } else {
            TargetState::Unknown
        }
    }

    pub(crate) fn summary(&self) -> BuildSummary {
        BuildSummary {
            done: self.done.len(),
            failed: self.failed.len(),
            building: self.building.len(),
        }
    }

    pub(crate) fn add_wait(&mut self, demander: &str, target: &str) {
        self.waits_for
            .entry(demander.to_string())
            .or_default()
            .push(target.to_string());
    }

    pub(crate) fn clear_waits(&mut self, demander: &str) {
        self.waits_for.remove(demander);
    }

    /// If `target` is (transitively) blocked on `demander`, return the cycle
    /// that joining it would close, starting and ending at `demander`.
    pub(crate) fn cycle_through(&self, demander: &str, target: &str) -> Option<Vec<Target>> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<Vec<&str>> = vec![vec![target]];

        while let Some(path) = stack.pop() {
            let last = *path.last()?;
            if last == demander {
                let mut cycle = Vec::with_capacity(path.len() + 1);
                cycle.push(demander.to_string());
                cycle.extend(path.iter().map(|s| s.to_string()));
                return Some(cycle);
            }
            if !visited.insert(last) {
                continue;
            }
            for next in self.waits_for.get(last).into_iter().flatten() {
                let mut extended = path.clone();
                extended.push(next.as_str());
                stack.push(extended);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_moves_to_a_single_terminal_state() {
        let mut table = TargetTable::default();
        assert_eq!(table.state_of("a"), TargetState::Unknown);

        let (_tx, _rx) = table.start("a");
        assert_eq!(table.state_of("a"), TargetState::Building);
        assert!(matches!(table.lookup("a"), Lookup::Building(_)));

        table.finish("a", &Ok(()));
        assert_eq!(table.state_of("a"), TargetState::Done);
        assert!(matches!(table.lookup("a"), Lookup::Done));
        assert_eq!(
            table.summary(),
            BuildSummary {
                done: 1,
                failed: 0,
                building: 0
            }
        );
    }

    #[test]
    fn failure_is_stored_for_replay() {
        let mut table = TargetTable::default();
        let _ = table.start("bad");
        let err = BuildError::NoMatchingRule {
            target: "missing".to_string(),
        };
        table.finish("bad", &Err(err.clone()));

        match table.lookup("bad") {
            Lookup::Failed(stored) => assert_eq!(stored, err),
            other => panic!("expected Failed, got {other:?}"),
        }
        assert_eq!(table.state_of("bad"), TargetState::Failed);
    }

    #[test]
    fn self_wait_is_a_cycle() {
        let table = TargetTable::default();
        assert_eq!(
            table.cycle_through("a", "a"),
            Some(vec!["a".to_string(), "a".to_string()])
        );
    }

    #[test]
    fn transitive_wait_is_a_cycle() {
        let mut table = TargetTable::default();
        table.add_wait("a", "b");
        table.add_wait("b", "c");

        assert_eq!(
            table.cycle_through("c", "a"),
            Some(vec![
                "c".to_string(),
                "a".to_string(),
                "b".to_string(),
                "c".to_string()
            ])
        );
        assert_eq!(table.cycle_through("d", "a"), None);
    }

    #[test]
    fn cleared_waits_do_not_report_cycles() {
        let mut table = TargetTable::default();
        table.add_wait("a", "b");
        table.clear_waits("a");
        assert_eq!(table.cycle_through("b", "a"), None);
    }
}
