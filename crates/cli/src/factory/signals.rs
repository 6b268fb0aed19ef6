// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Termination signals for the factory.
//!
//! SIGUSR1 and SIGTERM go through plain `signal()`, SIGUSR2 is ignored, and
//! SIGINT is installed with `sigaction()` (no SA_RESTART, empty mask). Every
//! handler sets the same process-wide flag and writes one byte to a
//! self-pipe so the main thread can block instead of spinning, both at the
//! thread count prompt and while the workers run.

#![allow(unsafe_code)]

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::io::{self, Read};
use std::os::fd::{AsFd, AsRawFd};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const POLL_FALLBACK: Duration = Duration::from_millis(50);
const READ_CHUNK: usize = 8 * 1024;

/// Set once by a signal handler, never cleared
static TERMINATION_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Write end of the self-pipe, or -1 before `install`
static WAKE_FD: AtomicI32 = AtomicI32::new(-1);

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("failed to create wake-up pipe: {0}")]
    Pipe(#[source] io::Error),

    #[error("failed to register handler for {signal:?}: {source}")]
    Register {
        signal: Signal,
        #[source]
        source: Errno,
    },
}

extern "C" fn request_termination(_signal: libc::c_int) {
    TERMINATION_REQUESTED.store(true, Ordering::SeqCst);

    let fd = WAKE_FD.load(Ordering::SeqCst);
    if fd >= 0 {
        let byte = 1u8;
        // SAFETY: write(2) is async-signal-safe and fd stays open for the
        // life of the process; a full pipe (EAGAIN) is fine, one byte suffices
        unsafe { libc::write(fd, (&byte as *const u8).cast(), 1) };
    }
}

fn register(signal: Signal, handler: SigHandler) -> Result<(), SignalError> {
    // SAFETY: request_termination only touches atomics and calls write(2)
    unsafe { signal::signal(signal, handler) }
        .map(drop)
        .map_err(|source| SignalError::Register { signal, source })
}

/// Handle to the termination flag, returned by [`install`]
pub struct Termination {
    requested: &'static AtomicBool,
    wake: UnixStream,
    // Kept open so WAKE_FD stays valid
    _notify: UnixStream,
}

/// Result of a read that termination can cut short
#[derive(Debug, PartialEq, Eq)]
pub enum Interruptible<T> {
    Done(T),
    Terminated,
}

/// Install the factory's signal dispositions.
///
/// A SIGINT registration failure is reported as its own error so the caller
/// can exit nonzero.
pub fn install() -> Result<Termination, SignalError> {
    let (wake, notify) = UnixStream::pair().map_err(SignalError::Pipe)?;
    notify.set_nonblocking(true).map_err(SignalError::Pipe)?;
    WAKE_FD.store(notify.as_raw_fd(), Ordering::SeqCst);

    let handler = SigHandler::Handler(request_termination);
    register(Signal::SIGUSR1, handler)?;
    register(Signal::SIGTERM, handler)?;
    register(Signal::SIGUSR2, SigHandler::SigIgn)?;

    let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
    // SAFETY: same handler as above
    unsafe { signal::sigaction(Signal::SIGINT, &action) }.map_err(|source| {
        SignalError::Register {
            signal: Signal::SIGINT,
            source,
        }
    })?;

    debug!("signal handlers installed");
    Ok(Termination {
        requested: &TERMINATION_REQUESTED,
        wake,
        _notify: notify,
    })
}

impl Termination {
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Read one line from `input`, giving up once termination is requested.
    ///
    /// `Done(None)` means end of input. Invalid UTF-8 is replaced, not
    /// rejected, so the caller's parser reports it.
    pub fn read_line<R: Read + AsFd>(
        &mut self,
        input: &mut R,
    ) -> io::Result<Interruptible<Option<String>>> {
        let mut line = Vec::new();
        // At least stdin's internal buffer, so reads bypass it and poll sees
        // every pending byte
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            if self.is_requested() {
                return Ok(Interruptible::Terminated);
            }

            let (readable, woken) = {
                let mut fds = [
                    PollFd::new(input.as_fd(), PollFlags::POLLIN),
                    PollFd::new(self.wake.as_fd(), PollFlags::POLLIN),
                ];
                match poll(&mut fds, PollTimeout::NONE) {
                    Ok(_) => {}
                    Err(Errno::EINTR) => continue,
                    Err(e) => return Err(e.into()),
                }
                (has_events(&fds[0]), has_events(&fds[1]))
            };

            if woken {
                self.drain_wake();
                continue;
            }
            if !readable {
                continue;
            }

            let n = match input.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if n == 0 {
                return Ok(Interruptible::Done(
                    (!line.is_empty()).then(|| lossy_trimmed(&line)),
                ));
            }
            line.extend_from_slice(&chunk[..n]);
            if let Some(end) = line.iter().position(|&b| b == b'\n') {
                line.truncate(end);
                return Ok(Interruptible::Done(Some(lossy_trimmed(&line))));
            }
        }
    }

    fn drain_wake(&mut self) {
        let mut buf = [0u8; 16];
        if let Err(e) = self.wake.read(&mut buf) {
            if e.kind() != io::ErrorKind::Interrupted {
                warn!(error = %e, "wake-up pipe read failed");
            }
        }
    }

    /// Block until a termination signal has been received
    pub fn wait(&mut self) {
        let mut buf = [0u8; 16];
        let mut polling = false;
        while !self.is_requested() {
            if polling {
                std::thread::sleep(POLL_FALLBACK);
                continue;
            }
            match self.wake.read(&mut buf) {
                Ok(n) if n > 0 => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                other => {
                    // Both ends are owned here, so EOF or an error means the
                    // pipe is unusable; fall back to polling the flag
                    warn!(result = ?other, "wake-up pipe read failed, polling instead");
                    polling = true;
                }
            }
        }
    }
}

fn has_events(fd: &PollFd<'_>) -> bool {
    fd.revents().is_some_and(|events| !events.is_empty())
}

fn lossy_trimmed(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;
