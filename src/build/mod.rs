// src/build/mod.rs

//! Pull-based build scheduler.
//!
//! - [`scheduler`] holds [`Build`]: rule registration, `need` and `run`.
//! - [`rules`] is the ordered rule table with first-match glob lookup.
//! - [`state`] tracks which targets are building, done or failed.
//! - [`pool`] runs rule handlers on a growable thread pool.
//! - [`graph`] records the dependency edges discovered during a build.

pub mod graph;
pub mod pool;
pub mod rules;
pub mod scheduler;
pub(crate) mod state;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use graph::DependencyGraph;
pub use pool::{BuildOptions, DEFAULT_MAX_THREADS};
pub use rules::{Handler, Rule, RuleTable};
pub use scheduler::Build;

/// Lock a mutex, ignoring poisoning.
///
/// Handlers never run while one of the scheduler's locks is held, so a
/// poisoned lock can only come from the scheduler's own bookkeeping.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
