// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Console input for the factory and releaser prompts.
//!
//! Both prompts read one integer per line. Anything that is not a
//! non-negative integer is rejected with an [`InputError`] instead of being
//! coerced, and absurdly large values are capped.

use std::io::{self, BufRead, Write};
use std::num::IntErrorKind;
use thiserror::Error;

/// Upper bound on worker threads a single factory will spawn
pub const MAX_THREADS: usize = 4096;

/// Upper bound on permits released in one round
pub const MAX_RELEASE: u32 = 1_000_000;

/// Errors from parsing a console line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("no value entered")]
    Empty,

    #[error("{0:?} is not a number")]
    NotANumber(String),

    #[error("{0} is negative; enter a count of zero or more")]
    Negative(i64),

    #[error("{value} is too large (maximum {max})")]
    TooLarge { value: String, max: u64 },
}

/// What the operator asked the releaser to do this round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseRequest {
    /// The sentinel `0`: stop prompting
    Stop,
    /// Post the semaphore this many times
    Release(u32),
}

fn parse_count(line: &str, max: u64) -> Result<u64, InputError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }

    let value: i64 = trimmed.parse().map_err(|e: std::num::ParseIntError| match e.kind() {
        IntErrorKind::PosOverflow => InputError::TooLarge {
            value: trimmed.to_string(),
            max,
        },
        IntErrorKind::NegOverflow => InputError::Negative(i64::MIN),
        _ => InputError::NotANumber(trimmed.to_string()),
    })?;

    if value < 0 {
        return Err(InputError::Negative(value));
    }
    let value = value as u64;
    if value > max {
        return Err(InputError::TooLarge {
            value: trimmed.to_string(),
            max,
        });
    }
    Ok(value)
}

/// Parse the factory's thread count. Zero is allowed and spawns no workers.
pub fn parse_thread_count(line: &str) -> Result<usize, InputError> {
    parse_count(line, MAX_THREADS as u64).map(|n| n as usize)
}

/// Parse one releaser round; `0` is the stop sentinel.
pub fn parse_release_count(line: &str) -> Result<ReleaseRequest, InputError> {
    match parse_count(line, u64::from(MAX_RELEASE))? {
        0 => Ok(ReleaseRequest::Stop),
        n => Ok(ReleaseRequest::Release(n as u32)),
    }
}

/// Line-oriented prompt over any reader/writer pair
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `prompt` and read one line. `None` means end of input.
    ///
    /// Bytes that are not UTF-8 are replaced rather than failing the read,
    /// so they reach the parser and are rejected like any other bad count.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        writeln!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&line).trim().to_string()))
    }

    #[cfg(test)]
    pub(crate) fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
