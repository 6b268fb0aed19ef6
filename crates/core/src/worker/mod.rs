// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Semaphore-gated worker threads
//!
//! Each worker loops `WAITING -> WORKING -> WAITING`: block on the semaphore,
//! consume one unit, simulate work for a fixed delay, repeat. The pool owns
//! the threads and the shutdown token that ends the loop.

mod pool;
mod runner;
mod state;

pub use pool::{ShutdownReport, Spawner, ThreadSpawner, WorkerHandle, WorkerPool};
pub use runner::Worker;
pub use state::{StatsSnapshot, WorkerState, WorkerStats};
