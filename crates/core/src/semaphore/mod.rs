// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Counting semaphores shared between the factory and the releaser
//!
//! This module provides:
//! - **CountingSemaphore** - the wait/post seam the worker pool and release loop run against
//! - **NamedSemaphore** - a POSIX named semaphore visible to unrelated processes
//! - **LocalSemaphore** - an in-process semaphore with the same semantics
//! - **SemaphoreName** - a validated, normalised POSIX semaphore name

mod local;
mod posix;

pub use local::LocalSemaphore;
pub use posix::{CreateOptions, NamedSemaphore};

use nix::errno::Errno;
use std::ffi::CString;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Name both processes rendezvous on unless configured otherwise
pub const DEFAULT_NAME: &str = "/factorySem";

/// Longest name accepted, leaving room for the `sem.` prefix glibc adds under /dev/shm
pub const MAX_NAME_LEN: usize = 251;

/// A counting semaphore: `wait` consumes one unit, `post` adds one.
///
/// Implementations guarantee the count never goes negative and that a
/// single posted unit is consumed by at most one waiter.
pub trait CountingSemaphore: Send + Sync {
    /// Block until the count is positive, then atomically take one unit
    fn wait(&self) -> Result<(), SemaphoreError>;

    /// Add one unit, waking at most one blocked waiter
    fn post(&self) -> Result<(), SemaphoreError>;

    /// Current count (best effort; may be stale as soon as it returns)
    fn value(&self) -> Result<u32, SemaphoreError>;
}

/// Semaphore errors
#[derive(Debug, Error)]
pub enum SemaphoreError {
    #[error("invalid semaphore name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("failed to create semaphore {name}: {source}")]
    Create {
        name: SemaphoreName,
        #[source]
        source: Errno,
    },

    #[error("semaphore {name} does not exist (is the factory running?)")]
    NotFound { name: SemaphoreName },

    #[error("failed to open semaphore {name}: {source}")]
    Open {
        name: SemaphoreName,
        #[source]
        source: Errno,
    },

    #[error("semaphore wait failed: {0}")]
    Wait(#[source] Errno),

    #[error("semaphore post failed: {0}")]
    Post(#[source] Errno),

    #[error("failed to read semaphore value: {0}")]
    Value(#[source] Errno),

    #[error("failed to close semaphore {name}: {source}")]
    Close {
        name: SemaphoreName,
        #[source]
        source: Errno,
    },

    #[error("failed to unlink semaphore {name}: {source}")]
    Unlink {
        name: SemaphoreName,
        #[source]
        source: Errno,
    },
}

impl SemaphoreError {
    /// True when the named object is absent from the system namespace
    pub fn is_not_found(&self) -> bool {
        matches!(self, SemaphoreError::NotFound { .. })
    }
}

/// A POSIX semaphore name, always stored with exactly one leading `/`.
///
/// `factorySem` and `/factorySem` normalise to the same name, so the
/// factory and the releaser agree byte-for-byte whichever form they were
/// configured with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SemaphoreName(String);

impl SemaphoreName {
    pub fn new(raw: impl Into<String>) -> Result<Self, SemaphoreError> {
        let raw = raw.into();
        let invalid = |reason| SemaphoreError::InvalidName {
            name: raw.clone(),
            reason,
        };

        let body = raw.strip_prefix('/').unwrap_or(&raw);
        if body.is_empty() {
            return Err(invalid("name is empty"));
        }
        if body.contains('/') {
            return Err(invalid("only a single leading '/' is allowed"));
        }
        if body.contains('\0') {
            return Err(invalid("name contains a NUL byte"));
        }
        if body.len() > MAX_NAME_LEN {
            return Err(invalid("name is too long"));
        }

        Ok(Self(format!("/{}", body)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn to_cstring(&self) -> Result<CString, SemaphoreError> {
        CString::new(self.as_str()).map_err(|_| SemaphoreError::InvalidName {
            name: self.0.clone(),
            reason: "name contains a NUL byte",
        })
    }
}

impl Default for SemaphoreName {
    fn default() -> Self {
        Self(DEFAULT_NAME.to_string())
    }
}

impl FromStr for SemaphoreName {
    type Err = SemaphoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for SemaphoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[path = "name_tests.rs"]
mod tests;
