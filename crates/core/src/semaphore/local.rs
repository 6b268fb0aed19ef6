// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process counting semaphore

use super::{CountingSemaphore, SemaphoreError};
use nix::errno::Errno;
use std::sync::{Condvar, Mutex};

/// Same contract as [`NamedSemaphore`](super::NamedSemaphore), scoped to one process.
///
/// Used to exercise the worker pool and release loop without creating
/// kernel objects.
#[derive(Debug, Default)]
pub struct LocalSemaphore {
    count: Mutex<u32>,
    available: Condvar,
}

impl LocalSemaphore {
    pub fn new(initial: u32) -> Self {
        Self {
            count: Mutex::new(initial),
            available: Condvar::new(),
        }
    }
}

impl CountingSemaphore for LocalSemaphore {
    fn wait(&self) -> Result<(), SemaphoreError> {
        let count = self.count.lock().unwrap_or_else(|e| e.into_inner());
        let mut count = self
            .available
            .wait_while(count, |count| *count == 0)
            .unwrap_or_else(|e| e.into_inner());
        *count -= 1;
        Ok(())
    }

    fn post(&self) -> Result<(), SemaphoreError> {
        let mut count = self.count.lock().unwrap_or_else(|e| e.into_inner());
        *count = count
            .checked_add(1)
            .ok_or(SemaphoreError::Post(Errno::EOVERFLOW))?;
        // One unit, one waiter
        self.available.notify_one();
        Ok(())
    }

    fn value(&self) -> Result<u32, SemaphoreError> {
        Ok(*self.count.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
