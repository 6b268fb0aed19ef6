// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Set-once shutdown token shared between the main thread and workers

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Cooperative cancellation: flips false -> true once and never resets.
///
/// Cloning shares the same token.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    triggered: Mutex<bool>,
    changed: Condvar,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Returns true only for the call that flipped the token.
    pub fn trigger(&self) -> bool {
        let mut triggered = self.inner.triggered.lock().unwrap_or_else(|e| e.into_inner());
        if *triggered {
            return false;
        }
        *triggered = true;
        self.inner.changed.notify_all();
        true
    }

    pub fn is_triggered(&self) -> bool {
        *self.inner.triggered.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sleep for `timeout` unless shutdown is requested first.
    ///
    /// Returns true if the token was triggered.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let triggered = self.inner.triggered.lock().unwrap_or_else(|e| e.into_inner());
        let (triggered, _) = self
            .inner
            .changed
            .wait_timeout_while(triggered, timeout, |triggered| !*triggered)
            .unwrap_or_else(|e| e.into_inner());
        *triggered
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
