// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Factory lifecycle: create the semaphore and pool, tear both down.
//!
//! The factory owns the named semaphore: it creates it on startup and is
//! the only process that unlinks it. Workers still running when the
//! shutdown grace period ends are abandoned to process exit.

use semgate_core::{Config, CountingSemaphore, NamedSemaphore, SemaphoreError};
use semgate_core::{ShutdownReport, WorkerPool};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Semaphore(#[from] SemaphoreError),
}

/// Running factory state
pub struct Factory {
    semaphore: Arc<NamedSemaphore>,
    pool: WorkerPool<NamedSemaphore>,
    shutdown_grace: Duration,
}

/// Create the named semaphore and spawn `threads` workers
pub fn startup(config: &Config, threads: usize) -> Result<Factory, LifecycleError> {
    let name = config.semaphore_name()?;
    let semaphore = Arc::new(NamedSemaphore::create(&name, config.create_options())?);
    info!(
        name = %name,
        mode = %config.semaphore.mode,
        "Created named semaphore {}",
        name
    );

    // A crashed factory can leave the object behind with permits still in it
    match semaphore.value() {
        Ok(0) => {}
        Ok(pending) => warn!(pending, "Semaphore {} already holds {} permits", name, pending),
        Err(e) => warn!(error = %e, "Could not read initial semaphore value"),
    }

    if threads == 0 {
        warn!("No worker threads requested; releases will accumulate as permits");
    }

    let pool = WorkerPool::spawn(threads, Arc::clone(&semaphore), config.factory.work_delay);
    if pool.failed() > 0 {
        warn!(
            requested = pool.requested(),
            spawned = pool.spawned(),
            failed = pool.failed(),
            "Started {} of {} worker threads",
            pool.spawned(),
            pool.requested()
        );
    } else {
        info!(spawned = pool.spawned(), "Started {} worker threads", pool.spawned());
    }

    Ok(Factory {
        semaphore,
        pool,
        shutdown_grace: config.factory.shutdown_grace,
    })
}

impl Factory {
    pub fn spawned(&self) -> usize {
        self.pool.spawned()
    }

    /// Stop workers, close the handle, then unlink the name.
    ///
    /// Close and unlink failures are logged, not returned: the process is
    /// exiting either way and the remaining steps should still run.
    pub fn shutdown(self) -> ShutdownReport {
        info!("Shutting down factory...");
        let Factory {
            semaphore,
            pool,
            shutdown_grace,
        } = self;
        let name = semaphore.name().clone();

        let stats = pool.stats();
        let report = pool.shutdown(shutdown_grace);
        info!(
            joined = report.joined,
            abandoned = report.abandoned,
            exited = report.exited,
            consumed = stats.consumed,
            "Worker pool stopped"
        );

        // 1. Close our handle (only possible once no worker holds a reference)
        match Arc::try_unwrap(semaphore) {
            Ok(semaphore) => {
                if let Err(e) = semaphore.close() {
                    warn!(error = %e, "Failed to close semaphore");
                }
            }
            Err(_) => warn!(
                abandoned = report.abandoned,
                "Semaphore handle still held by abandoned workers; leaving it to process exit"
            ),
        }

        // 2. Remove the name so later opens fail
        match NamedSemaphore::unlink(&name) {
            Ok(()) => info!(name = %name, "Unlinked semaphore {}", name),
            Err(e) => warn!(error = %e, "Failed to unlink semaphore"),
        }

        info!("Factory shutdown complete");
        report
    }
}
