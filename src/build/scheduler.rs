// src/build/scheduler.rs

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::build::graph::DependencyGraph;
use crate::build::lock;
use crate::build::pool::{self, BuildOptions, PoolHandle, WorkerPool};
use crate::build::rules::{Handler, Rule, RuleTable};
use crate::build::state::{Completion, CompletionSender, Lookup, TargetTable};
use crate::errors::BuildError;
use crate::types::{BuildSummary, Target, TargetState};

/// Pull-based build scheduler.
///
/// Targets are built on demand via [`need`](Build::need). Rules declare their
/// dependencies by calling `need` from inside their handler, so the graph is
/// discovered while it is being built. Guarantees:
///
/// - each target's handler runs at most once per `Build`;
/// - concurrent demands for a building target join the in-flight build;
/// - a failure is stored permanently and replayed to every later demand;
/// - independent targets run in parallel on the worker pool.
///
/// `Build` is a cheap handle; clones share the same rules and state.
#[derive(Clone)]
pub struct Build {
    inner: Arc<Inner>,
}

struct Inner {
    options: BuildOptions,
    /// Rule table, target table and dependency record, all under one lock.
    state: Mutex<BuildState>,
    /// Installed for the duration of `run`.
    pool: Mutex<Option<PoolHandle>>,
}

#[derive(Default)]
struct BuildState {
    rules: RuleTable,
    targets: TargetTable,
    graph: DependencyGraph,
}

impl BuildState {
    fn record_demand(&mut self, demander: Option<&str>, target: &str) {
        match demander {
            Some(demander) => self.graph.add_dependency(demander, target),
            None => {
                self.graph.add_target(target);
            }
        }
    }
}

/// Drops the demander's waits-for edges when `need` returns, on every path.
struct WaitRegistration<'a> {
    build: &'a Build,
    demander: Option<Target>,
}

impl Drop for WaitRegistration<'_> {
    fn drop(&mut self) {
        if let Some(demander) = &self.demander {
            self.build.state().targets.clear_waits(demander);
        }
    }
}

impl fmt::Debug for Build {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Build")
            .field("options", &self.inner.options)
            .field("summary", &self.summary())
            .finish_non_exhaustive()
    }
}

impl Default for Build {
    fn default() -> Self {
        Self::new()
    }
}

impl Build {
    /// Scheduler sized from the host's available parallelism.
    pub fn new() -> Self {
        Self::with_options(BuildOptions::default())
    }

    pub fn with_options(options: BuildOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                options,
                state: Mutex::new(BuildState::default()),
                pool: Mutex::new(None),
            }),
        }
    }

    pub fn options(&self) -> BuildOptions {
        self.inner.options
    }

    /// Register a rule. Lookup is first match in registration order.
    ///
    /// The pattern is not validated here; a malformed glob simply never
    /// matches.
    pub fn rule<F>(&self, pattern: impl Into<String>, handler: F) -> &Self
    where
        F: Fn(&Build, &str) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        self.state().rules.push(Rule::new(pattern, handler));
        self
    }

    /// Patterns of all registered rules, in lookup order.
    pub fn patterns(&self) -> Vec<String> {
        self.state()
            .rules
            .iter()
            .map(|rule| rule.pattern().to_string())
            .collect()
    }

    /// Demand that `targets` are built and block until they are.
    ///
    /// Targets are handled in order. An already-failed target returns its
    /// stored error right away; targets before it that were started keep
    /// building, targets after it are not looked at. Otherwise every building
    /// or newly started target is awaited in order and the first failure is
    /// returned.
    pub fn need<I, S>(&self, targets: I) -> Result<(), BuildError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pool = self.pool()?;
        let registration = WaitRegistration {
            build: self,
            demander: pool::current_target(),
        };
        let demander = registration.demander.as_deref();

        let mut pending: Vec<(Target, Completion)> = Vec::new();

        for target in targets {
            let target = target.as_ref();
            let mut state = self.state();

            match state.targets.lookup(target) {
                Lookup::Failed(err) => {
                    debug!(name = %target, "target already failed; replaying stored error");
                    state.record_demand(demander, target);
                    return Err(err);
                }
                Lookup::Done => {
                    state.record_demand(demander, target);
                }
                Lookup::Building(completion) => {
                    if let Some(demander) = demander {
                        if let Some(cycle) = state.targets.cycle_through(demander, target) {
                            warn!(
                                name = %target,
                                demander = %demander,
                                "dependency cycle; refusing to wait"
                            );
                            return Err(BuildError::DependencyCycle { cycle });
                        }
                        state.targets.add_wait(demander, target);
                    }
                    state.record_demand(demander, target);
                    pending.push((target.to_string(), completion));
                }
                Lookup::Unknown => {
                    let handler = state.rules.find(target)?.handler();
                    let (done_tx, completion) = state.targets.start(target);
                    if let Some(demander) = demander {
                        state.targets.add_wait(demander, target);
                    }
                    state.record_demand(demander, target);

                    let build = self.clone();
                    let owned = target.to_string();
                    pool.spawn(target.to_string(), move || {
                        build.execute(&owned, handler, done_tx)
                    });
                    pending.push((target.to_string(), completion));
                }
            }
        }

        for (target, completion) in pending {
            debug!(name = %target, "waiting on target");
            pool.wait(&target, completion)?;
        }

        Ok(())
    }

    /// Build `root` and everything it needs, then tear the worker pool down.
    ///
    /// Handlers still running when `root` resolves (e.g. siblings of a failed
    /// dependency) are waited for before returning. Must be called from
    /// synchronous code, not from inside an async task.
    pub fn run(&self, root: &str) -> Result<(), BuildError> {
        let pool = self.install_pool()?;
        let started = Instant::now();
        info!(
            root = %root,
            jobs = self.inner.options.jobs,
            "build started"
        );

        let result = self.need([root]);

        pool.drain();
        *lock(&self.inner.pool) = None;
        drop(pool);

        let summary = self.summary();
        info!(
            root = %root,
            ok = result.is_ok(),
            done = summary.done,
            failed = summary.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "build finished"
        );

        result
    }

    /// Current state of `target`.
    pub fn state_of(&self, target: &str) -> TargetState {
        self.state().targets.state_of(target)
    }

    pub fn summary(&self) -> BuildSummary {
        self.state().targets.summary()
    }

    /// Snapshot of the dependency edges discovered so far.
    pub fn graph(&self) -> DependencyGraph {
        self.state().graph.clone()
    }

    fn state(&self) -> MutexGuard<'_, BuildState> {
        lock(&self.inner.state)
    }

    fn pool(&self) -> Result<PoolHandle, BuildError> {
        lock(&self.inner.pool).clone().ok_or(BuildError::NotRunning)
    }

    fn install_pool(&self) -> Result<WorkerPool, BuildError> {
        let mut slot = lock(&self.inner.pool);
        if slot.is_some() {
            return Err(BuildError::AlreadyRunning);
        }
        let pool = WorkerPool::new(&self.inner.options)?;
        *slot = Some(pool.handle());
        Ok(pool)
    }

    /// Run the handler for `target` on the current pool thread and publish
    /// the outcome.
    fn execute(&self, target: &str, handler: Handler, done_tx: CompletionSender) {
        debug!(name = %target, "building target");

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| (*handler)(self, target))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(BuildError::from_handler(target, err)),
            Err(payload) => Err(BuildError::from_panic(target, payload)),
        };

        self.state().targets.finish(target, &outcome);

        match &outcome {
            Ok(()) => debug!(name = %target, "completed target"),
            Err(err) => debug!(name = %target, error = %err, "target failed"),
        }

        // Outside the lock: wake everyone already waiting on this build.
        done_tx.send_replace(Some(outcome));
    }
}
