use crate::refactor::conflicts::ConflictReport;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Progress sink polled by long-running analysis passes
pub trait ProgressReporter: Sync {
    fn report(&self, _done: usize, _total: usize) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Asks the caller whether a move with the given conflicts should go ahead
pub trait ConfirmationGate {
    fn confirm(&self, report: &ConflictReport) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// Cooperative cancellation shared with another thread
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl ProgressReporter for CancelToken {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl ConfirmationGate for AlwaysConfirm {
    fn confirm(&self, _report: &ConflictReport) -> bool {
        true
    }
}

/// Declines any move that has conflicts
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectConflicts;

impl ConfirmationGate for RejectConflicts {
    fn confirm(&self, report: &ConflictReport) -> bool {
        report.is_empty()
    }
}
