//! Per-query progress tracking.
//!
//! Operators register units of work when they are built, mark them running
//! when execution starts and completed when they are drained. The counters are
//! diagnostics only; nothing branches on them.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared progress counters for one operator tree.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    num_tasks: AtomicU64,
    num_tasks_running: AtomicU64,
    num_tasks_completed: AtomicU64,
}

/// A point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionProgress {
    pub registered: u64,
    pub running: u64,
    pub completed: u64,
}

impl ExecutionProgress {
    /// Completed over registered, 0.0 when nothing was registered.
    pub fn fraction_completed(&self) -> f64 {
        if self.registered == 0 {
            0.0
        } else {
            self.completed as f64 / self.registered as f64
        }
    }
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_num_tasks(&self) {
        self.num_tasks.fetch_add(1, Ordering::Release);
    }

    pub fn increment_num_tasks_running(&self) {
        self.num_tasks_running.fetch_add(1, Ordering::Release);
    }

    pub fn increment_num_tasks_completed(&self) {
        self.num_tasks_completed.fetch_add(1, Ordering::Release);
    }

    pub fn progress(&self) -> ExecutionProgress {
        // Loaded in reverse lifecycle order: completed <= running <= registered.
        let completed = self.num_tasks_completed.load(Ordering::Acquire);
        let running = self.num_tasks_running.load(Ordering::Acquire);
        let registered = self.num_tasks.load(Ordering::Acquire);
        ExecutionProgress {
            registered,
            running,
            completed,
        }
    }
}
