// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker loop states and pool-wide counters

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Where a worker is in its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Blocked on (or about to block on) the semaphore
    Waiting,
    /// Consumed a unit and is simulating work
    Working,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Waiting => f.write_str("waiting"),
            WorkerState::Working => f.write_str("working"),
        }
    }
}

/// Counters shared by every worker in a pool.
///
/// The semaphore is the only coordination between workers; these counters
/// are observation only and never gate the loop.
#[derive(Debug, Default)]
pub struct WorkerStats {
    waiting: AtomicUsize,
    working: AtomicUsize,
    consumed: AtomicU64,
    wait_failures: AtomicU64,
    exited: AtomicUsize,
}

/// Point-in-time copy of [`WorkerStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub waiting: usize,
    pub working: usize,
    /// Semaphore units consumed by entering WORKING
    pub consumed: u64,
    pub wait_failures: u64,
    pub exited: usize,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn gauge(&self, state: WorkerState) -> &AtomicUsize {
        match state {
            WorkerState::Waiting => &self.waiting,
            WorkerState::Working => &self.working,
        }
    }

    pub(crate) fn enter(&self, state: WorkerState) {
        self.gauge(state).fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn leave(&self, state: WorkerState) {
        self.gauge(state).fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn transition(&self, from: WorkerState, to: WorkerState) {
        self.enter(to);
        self.leave(from);
    }

    pub(crate) fn record_consumed(&self) {
        self.consumed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_wait_failure(&self) {
        self.wait_failures.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_exit(&self) {
        self.exited.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            waiting: self.waiting.load(Ordering::SeqCst),
            working: self.working.load(Ordering::SeqCst),
            consumed: self.consumed.load(Ordering::SeqCst),
            wait_failures: self.wait_failures.load(Ordering::SeqCst),
            exited: self.exited.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
