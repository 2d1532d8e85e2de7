use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Thread-safe per-target invocation counter for rule handlers.
///
/// Clones share the same counts, so one clone can be moved into each
/// handler closure while the test keeps another for assertions.
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    counts: Arc<Mutex<HashMap<String, usize>>>,
    order: Arc<Mutex<Vec<String>>>,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, target: &str) {
        *self
            .counts
            .lock()
            .unwrap()
            .entry(target.to_string())
            .or_insert(0) += 1;
        self.order.lock().unwrap().push(target.to_string());
    }

    pub fn count(&self, target: &str) -> usize {
        self.counts.lock().unwrap().get(target).copied().unwrap_or(0)
    }

    /// Sum of all invocations.
    pub fn total(&self) -> usize {
        self.counts.lock().unwrap().values().sum()
    }

    /// Targets in the order their handlers started.
    pub fn order(&self) -> Vec<String> {
        self.order.lock().unwrap().clone()
    }
}
