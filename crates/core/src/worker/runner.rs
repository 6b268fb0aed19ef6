// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker loop run on each pool thread

use super::state::{WorkerState, WorkerStats};
use crate::semaphore::CountingSemaphore;
use crate::shutdown::ShutdownToken;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One semaphore-gated worker.
///
/// Exactly one semaphore unit is consumed per entry into WORKING. A wait
/// failure is logged and retried immediately; it never ends the loop.
pub struct Worker<S> {
    id: usize,
    semaphore: Arc<S>,
    shutdown: ShutdownToken,
    work_delay: Duration,
    stats: Arc<WorkerStats>,
}

impl<S: CountingSemaphore> Worker<S> {
    pub fn new(
        id: usize,
        semaphore: Arc<S>,
        shutdown: ShutdownToken,
        work_delay: Duration,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            id,
            semaphore,
            shutdown,
            work_delay,
            stats,
        }
    }

    /// Run until the shutdown token is triggered
    pub fn run(self) {
        let id = self.id;
        let thread = std::thread::current().id();
        info!(worker = id, ?thread, "Worker thread {} created", id);

        self.stats.enter(WorkerState::Waiting);
        while !self.shutdown.is_triggered() {
            if let Err(e) = self.semaphore.wait() {
                self.stats.record_wait_failure();
                warn!(worker = id, error = %e, "Worker thread {} wait failed, retrying", id);
                continue;
            }

            // Shutdown posts one unit per worker to get blocked waiters out
            if self.shutdown.is_triggered() {
                break;
            }

            self.stats.record_consumed();
            self.stats
                .transition(WorkerState::Waiting, WorkerState::Working);
            info!(worker = id, ?thread, status = 0, "Worker thread {} unblocked", id);

            self.shutdown.wait_timeout(self.work_delay);
            self.stats
                .transition(WorkerState::Working, WorkerState::Waiting);
        }
        self.stats.leave(WorkerState::Waiting);
        self.stats.record_exit();

        debug!(worker = id, "Worker thread {} stopped", id);
    }
}
