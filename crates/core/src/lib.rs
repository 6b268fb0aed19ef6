// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! semgate-core: a semaphore-gated thread release protocol
//!
//! This crate provides:
//! - Named (cross-process) and local counting semaphores behind one trait
//! - A worker pool whose threads block on the semaphore and simulate work
//! - The releaser's prompt loop that posts permits on demand
//! - Console parsing, layered configuration and logging setup

pub mod config;
pub mod input;
pub mod logging;
pub mod release;
pub mod semaphore;
pub mod shutdown;
pub mod worker;

// Re-exports
pub use config::{Config, ConfigError};
pub use input::{parse_release_count, parse_thread_count, Console, InputError, ReleaseRequest};
pub use release::{release, run_release_loop, ReleaseError, ReleaseSummary, RELEASE_PROMPT};
pub use semaphore::{
    CountingSemaphore, CreateOptions, LocalSemaphore, NamedSemaphore, SemaphoreError,
    SemaphoreName,
};
pub use shutdown::ShutdownToken;
pub use worker::{ShutdownReport, StatsSnapshot, WorkerPool, WorkerState};
