// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pool: spawn N semaphore-gated threads, stop them on shutdown

use super::runner::Worker;
use super::state::{StatsSnapshot, WorkerStats};
use crate::semaphore::CountingSemaphore;
use crate::shutdown::ShutdownToken;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, warn};

const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Creates the OS thread for one worker
pub trait Spawner {
    fn spawn(
        &mut self,
        name: String,
        body: Box<dyn FnOnce() + Send + 'static>,
    ) -> io::Result<JoinHandle<()>>;
}

/// Spawns real, named threads through `std::thread::Builder`
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSpawner;

impl Spawner for ThreadSpawner {
    fn spawn(
        &mut self,
        name: String,
        body: Box<dyn FnOnce() + Send + 'static>,
    ) -> io::Result<JoinHandle<()>> {
        thread::Builder::new().name(name).spawn(body)
    }
}

/// A spawned worker thread
#[derive(Debug)]
pub struct WorkerHandle {
    id: usize,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    #[cfg(test)]
    pub(crate) fn id(&self) -> usize {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

/// Outcome of [`WorkerPool::shutdown`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Workers that left their loop and were joined
    pub joined: usize,
    /// Workers joined after panicking
    pub panicked: usize,
    /// Workers still running when the grace period ran out; left to process exit
    pub abandoned: usize,
    /// Workers that reported leaving their loop, joined or not
    pub exited: usize,
}

/// A fixed set of worker threads sharing one semaphore
pub struct WorkerPool<S> {
    semaphore: Arc<S>,
    shutdown: ShutdownToken,
    stats: Arc<WorkerStats>,
    workers: Vec<WorkerHandle>,
    requested: usize,
    failed: usize,
}

impl<S: CountingSemaphore + 'static> WorkerPool<S> {
    /// Spawn `count` workers on real threads
    pub fn spawn(count: usize, semaphore: Arc<S>, work_delay: Duration) -> Self {
        Self::spawn_with(&mut ThreadSpawner, count, semaphore, work_delay)
    }

    /// Spawn `count` workers through `spawner`.
    ///
    /// A thread that cannot be created is logged and counted in `failed()`;
    /// the remaining workers are still started.
    pub fn spawn_with(
        spawner: &mut impl Spawner,
        count: usize,
        semaphore: Arc<S>,
        work_delay: Duration,
    ) -> Self {
        let shutdown = ShutdownToken::new();
        let stats = Arc::new(WorkerStats::new());
        let mut workers = Vec::with_capacity(count);
        let mut failed = 0;

        for id in 1..=count {
            let worker = Worker::new(
                id,
                Arc::clone(&semaphore),
                shutdown.clone(),
                work_delay,
                Arc::clone(&stats),
            );
            match spawner.spawn(format!("worker-{}", id), Box::new(move || worker.run())) {
                Ok(thread) => workers.push(WorkerHandle { id, thread }),
                Err(e) => {
                    failed += 1;
                    error!(worker = id, error = %e, "Failed to create worker thread {}", id);
                }
            }
        }

        Self {
            semaphore,
            shutdown,
            stats,
            workers,
            requested: count,
            failed,
        }
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn spawned(&self) -> usize {
        self.workers.len()
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    #[cfg(test)]
    pub(crate) fn workers(&self) -> &[WorkerHandle] {
        &self.workers
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    #[cfg(test)]
    pub(crate) fn shutdown_token(&self) -> &ShutdownToken {
        &self.shutdown
    }

    /// Stop every worker, waiting at most `grace` for them to leave their loop.
    ///
    /// Posts one unit per spawned worker so threads blocked in `wait` observe
    /// the token. Workers still running at the deadline are detached and
    /// reported as abandoned.
    pub fn shutdown(self, grace: Duration) -> ShutdownReport {
        let WorkerPool {
            semaphore,
            shutdown,
            stats,
            workers,
            ..
        } = self;

        shutdown.trigger();
        for _ in 0..workers.len() {
            if let Err(e) = semaphore.post() {
                warn!(error = %e, "Failed to wake blocked workers");
                break;
            }
        }

        let deadline = Instant::now() + grace;
        let mut report = ShutdownReport::default();
        let mut pending = workers;
        loop {
            let (finished, running): (Vec<_>, Vec<_>) =
                pending.into_iter().partition(WorkerHandle::is_finished);
            for worker in finished {
                match worker.thread.join() {
                    Ok(()) => report.joined += 1,
                    Err(_) => {
                        report.panicked += 1;
                        error!(worker = worker.id, "Worker thread {} panicked", worker.id);
                    }
                }
            }
            pending = running;

            if pending.is_empty() || Instant::now() >= deadline {
                break;
            }
            thread::sleep(JOIN_POLL_INTERVAL);
        }

        for worker in &pending {
            warn!(worker = worker.id, "Abandoning worker thread {}", worker.id);
        }
        report.abandoned = pending.len();
        report.exited = stats.snapshot().exited;
        report
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
