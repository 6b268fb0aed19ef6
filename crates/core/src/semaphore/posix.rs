// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! POSIX named semaphores (`sem_open` and friends)
//!
//! The kernel owns the count, so a `NamedSemaphore` created in one process
//! and opened in another share the same atomic counter. Creation and
//! unlinking are the owner's job; clients only open and close.

#![allow(unsafe_code)]

use super::{CountingSemaphore, SemaphoreError, SemaphoreName};
use nix::errno::Errno;
use std::fmt;
use std::ptr::NonNull;
use tracing::debug;

/// How the owning process creates the semaphore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateOptions {
    /// Permission bits for the new object (subject to umask)
    pub mode: u32,
    /// Count the semaphore starts with
    pub initial: u32,
    /// Fail with EEXIST instead of attaching to an existing object
    pub exclusive: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            mode: 0o600,
            initial: 0,
            exclusive: false,
        }
    }
}

/// Raw handle returned by `sem_open`; closed on drop
struct Handle(NonNull<libc::sem_t>);

impl Handle {
    fn from_raw(raw: *mut libc::sem_t) -> Result<Self, Errno> {
        if raw == libc::SEM_FAILED {
            return Err(Errno::last());
        }
        NonNull::new(raw).map(Handle).ok_or(Errno::EINVAL)
    }

    fn as_ptr(&self) -> *mut libc::sem_t {
        self.0.as_ptr()
    }

    fn close(self) -> Result<(), Errno> {
        let raw = self.as_ptr();
        std::mem::forget(self);
        // SAFETY: raw came from a successful sem_open and is closed exactly once
        Errno::result(unsafe { libc::sem_close(raw) }).map(drop)
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        // SAFETY: the handle is still open; close() forgets self before closing
        unsafe { libc::sem_close(self.as_ptr()) };
    }
}

/// A process-shared semaphore identified by name
pub struct NamedSemaphore {
    name: SemaphoreName,
    handle: Handle,
}

// SAFETY: sem_t operations are thread-safe; the handle is only released by
// close(self) or Drop, both of which require exclusive ownership.
unsafe impl Send for NamedSemaphore {}
unsafe impl Sync for NamedSemaphore {}

impl NamedSemaphore {
    /// Create the semaphore (or attach to it unless `exclusive`)
    pub fn create(name: &SemaphoreName, options: CreateOptions) -> Result<Self, SemaphoreError> {
        let c_name = name.to_cstring()?;
        let mut oflag = libc::O_CREAT;
        if options.exclusive {
            oflag |= libc::O_EXCL;
        }

        // SAFETY: c_name is NUL-terminated; mode and value are passed as the
        // promoted unsigned ints the variadic sem_open reads
        let raw = unsafe {
            libc::sem_open(
                c_name.as_ptr(),
                oflag,
                options.mode as libc::c_uint,
                options.initial as libc::c_uint,
            )
        };
        let handle = Handle::from_raw(raw).map_err(|source| SemaphoreError::Create {
            name: name.clone(),
            source,
        })?;

        debug!(name = %name, mode = %format_args!("{:o}", options.mode), "semaphore created");
        Ok(Self {
            name: name.clone(),
            handle,
        })
    }

    /// Open an existing semaphore; never creates one
    pub fn open(name: &SemaphoreName) -> Result<Self, SemaphoreError> {
        let c_name = name.to_cstring()?;

        // SAFETY: c_name is NUL-terminated; without O_CREAT no variadic args are read
        let raw = unsafe { libc::sem_open(c_name.as_ptr(), 0) };
        let handle = Handle::from_raw(raw).map_err(|source| match source {
            Errno::ENOENT => SemaphoreError::NotFound { name: name.clone() },
            source => SemaphoreError::Open {
                name: name.clone(),
                source,
            },
        })?;

        debug!(name = %name, "semaphore opened");
        Ok(Self {
            name: name.clone(),
            handle,
        })
    }

    /// Remove the name from the system namespace.
    ///
    /// Open handles keep working; later `open` calls fail with NotFound.
    pub fn unlink(name: &SemaphoreName) -> Result<(), SemaphoreError> {
        let c_name = name.to_cstring()?;

        // SAFETY: c_name is NUL-terminated
        Errno::result(unsafe { libc::sem_unlink(c_name.as_ptr()) })
            .map(drop)
            .map_err(|source| match source {
                Errno::ENOENT => SemaphoreError::NotFound { name: name.clone() },
                source => SemaphoreError::Unlink {
                    name: name.clone(),
                    source,
                },
            })
    }

    pub fn name(&self) -> &SemaphoreName {
        &self.name
    }

    /// Take one unit if available without blocking
    #[cfg(test)]
    pub(crate) fn try_wait(&self) -> Result<bool, SemaphoreError> {
        // SAFETY: the handle is open for the lifetime of self
        match Errno::result(unsafe { libc::sem_trywait(self.handle.as_ptr()) }) {
            Ok(_) => Ok(true),
            Err(Errno::EAGAIN) => Ok(false),
            Err(e) => Err(SemaphoreError::Wait(e)),
        }
    }

    /// Close this process's handle. Does not unlink the name.
    pub fn close(self) -> Result<(), SemaphoreError> {
        let NamedSemaphore { name, handle } = self;
        handle.close().map_err(|source| SemaphoreError::Close { name, source })
    }
}

impl CountingSemaphore for NamedSemaphore {
    fn wait(&self) -> Result<(), SemaphoreError> {
        // SAFETY: the handle is open for the lifetime of self
        Errno::result(unsafe { libc::sem_wait(self.handle.as_ptr()) })
            .map(drop)
            .map_err(SemaphoreError::Wait)
    }

    fn post(&self) -> Result<(), SemaphoreError> {
        // SAFETY: the handle is open for the lifetime of self
        Errno::result(unsafe { libc::sem_post(self.handle.as_ptr()) })
            .map(drop)
            .map_err(SemaphoreError::Post)
    }

    fn value(&self) -> Result<u32, SemaphoreError> {
        let mut value: libc::c_int = 0;
        // SAFETY: the handle is open and value is a valid out pointer
        Errno::result(unsafe { libc::sem_getvalue(self.handle.as_ptr(), &mut value) })
            .map_err(SemaphoreError::Value)?;
        // Linux reports 0 while waiters are blocked; other systems may report -waiters
        Ok(value.max(0) as u32)
    }
}

impl fmt::Debug for NamedSemaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedSemaphore")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "posix_tests.rs"]
mod tests;
