// src/build/pool.rs

//! Worker pool that runs rule handlers.
//!
//! Handlers are blocking code (they call `need` and wait), so they run on
//! the blocking thread pool of a dedicated tokio runtime rather than on its
//! async workers. Two limits apply:
//!
//! - `jobs`: how many handlers may be *doing work* at once. Each handler holds
//!   a semaphore permit while it runs and gives it back while it is blocked
//!   inside `need`, so a waiting parent never starves its own dependencies.
//! - `max_threads`: how many OS threads the pool may grow to. Every handler
//!   blocked in `need` still occupies a thread, so a dependency chain deeper
//!   than `max_threads` queues forever. Keep it well above the deepest chain.

use std::cell::RefCell;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::build::lock;
use crate::build::state::{Completion, Outcome};
use crate::errors::BuildError;
use crate::types::Target;

/// Default upper bound on pool threads.
pub const DEFAULT_MAX_THREADS: usize = 512;

/// Sizing of the worker pool created by [`Build::run`](crate::build::Build::run).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Maximum number of handlers executing (not blocked in `need`) at once.
    pub jobs: usize,
    /// Maximum number of pool threads, blocked ones included.
    pub max_threads: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        let jobs = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        Self {
            jobs,
            max_threads: DEFAULT_MAX_THREADS.max(jobs),
        }
    }
}

impl BuildOptions {
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self.max_threads = self.max_threads.max(self.jobs);
        self
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads.max(self.jobs);
        self
    }
}

thread_local! {
    /// The job a pool thread is currently running, if any.
    static CURRENT_JOB: RefCell<Option<ActiveJob>> = const { RefCell::new(None) };
}

struct ActiveJob {
    target: Target,
    permit: Option<OwnedSemaphorePermit>,
}

/// Target whose handler is running on the current thread.
///
/// `None` on the thread that called `run`, or on any thread outside the pool.
pub(crate) fn current_target() -> Option<Target> {
    CURRENT_JOB.with(|slot| slot.borrow().as_ref().map(|job| job.target.clone()))
}

/// Owns the runtime; lives on the thread that called `run`.
pub(crate) struct WorkerPool {
    runtime: Runtime,
    handle: PoolHandle,
}

/// Cheap, cloneable access to the pool for `need` and for jobs.
#[derive(Clone)]
pub(crate) struct PoolHandle {
    handle: Handle,
    permits: Arc<Semaphore>,
    spawned: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl WorkerPool {
    pub(crate) fn new(options: &BuildOptions) -> Result<Self, BuildError> {
        let jobs = options.jobs.max(1);
        let max_threads = options.max_threads.max(jobs);

        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(max_threads)
            .thread_name("pullbuild-worker")
            .enable_all()
            .build()
            .map_err(|err| BuildError::PoolStartup(Arc::new(err)))?;

        debug!(jobs, max_threads, "worker pool started");

        let handle = PoolHandle {
            handle: runtime.handle().clone(),
            permits: Arc::new(Semaphore::new(jobs)),
            spawned: Arc::new(Mutex::new(Vec::new())),
        };

        Ok(Self { runtime, handle })
    }

    pub(crate) fn handle(&self) -> PoolHandle {
        self.handle.clone()
    }

    /// Wait for every submitted job to finish, including jobs submitted by
    /// other jobs while draining.
    pub(crate) fn drain(&self) {
        loop {
            let batch = std::mem::take(&mut *lock(&self.handle.spawned));
            if batch.is_empty() {
                break;
            }
            for job in batch {
                if let Err(err) = self.runtime.block_on(job) {
                    warn!(error = %err, "worker job did not run to completion");
                }
            }
        }
        debug!("worker pool drained");
    }
}

impl PoolHandle {
    /// Queue `job` to build `target`. Never runs it inline.
    pub(crate) fn spawn<F>(&self, target: Target, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let handle = self.handle.clone();

        let join = self.handle.spawn_blocking(move || {
            let permit = handle.block_on(permits.acquire_owned()).ok();
            CURRENT_JOB.with(|slot| *slot.borrow_mut() = Some(ActiveJob { target, permit }));
            job();
            // Threads are reused; drop the permit and forget the target.
            CURRENT_JOB.with(|slot| slot.borrow_mut().take());
        });

        lock(&self.spawned).push(join);
    }

    /// Block until `completion` resolves. A pool thread gives up its permit
    /// for the duration of the wait.
    pub(crate) fn wait(&self, target: &str, mut completion: Completion) -> Outcome {
        let released = CURRENT_JOB.with(|slot| {
            slot.borrow_mut()
                .as_mut()
                .and_then(|job| job.permit.take())
                .is_some()
        });

        let outcome = self.handle.block_on(async {
            completion
                .wait_for(Option::is_some)
                .await
                .map(|value| value.clone())
        });

        if released {
            let permit = self
                .handle
                .block_on(Arc::clone(&self.permits).acquire_owned())
                .ok();
            CURRENT_JOB.with(|slot| {
                if let Some(job) = slot.borrow_mut().as_mut() {
                    job.permit = permit;
                }
            });
        }

        match outcome {
            Ok(Some(outcome)) => outcome,
            _ => Err(BuildError::Abandoned {
                target: target.to_string(),
            }),
        }
    }
}
