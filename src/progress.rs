//! Progress reporting seam for long-running operations.
//!
//! Indexing and suggestion generation take a reporter instead of printing,
//! so callers (CLI, tests) decide what to do with progress events.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait ProgressReporter: Send + Sync {
    /// Called once when an operation starts, with the total unit count if
    /// known.
    fn started(&self, operation: &str, total: Option<usize>);

    /// Called after each unit of work (a batch, a track).
    fn progressed(&self, operation: &str, done: usize);

    fn finished(&self, operation: &str);
}

/// Reporter that discards everything. The default for library callers.
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    fn started(&self, _operation: &str, _total: Option<usize>) {}
    fn progressed(&self, _operation: &str, _done: usize) {}
    fn finished(&self, _operation: &str) {}
}

/// Reporter that emits tracing events, used by the CLI.
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn started(&self, operation: &str, total: Option<usize>) {
        match total {
            Some(total) => tracing::info!("{} started ({} units)", operation, total),
            None => tracing::info!("{} started", operation),
        }
    }

    fn progressed(&self, operation: &str, done: usize) {
        tracing::debug!("{}: {} done", operation, done);
    }

    fn finished(&self, operation: &str) {
        tracing::info!("{} finished", operation);
    }
}

/// Shared cancellation flag checked at batch boundaries.
#[derive(Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_flag_is_shared_between_clones() {
        let flag = CancellationFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());
        flag.cancel();
        assert!(other.is_cancelled());
    }
}
