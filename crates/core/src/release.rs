// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Releaser side of the protocol: post permits on operator demand

use crate::input::{parse_release_count, Console, ReleaseRequest};
use crate::semaphore::{CountingSemaphore, SemaphoreError};
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{error, info};

/// Prompt shown before each round
pub const RELEASE_PROMPT: &str = "How many threads do you want to wake up?";

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("console error: {0}")]
    Io(#[from] io::Error),

    #[error("released {released} of {requested} permits: {source}")]
    Partial {
        released: u32,
        requested: u32,
        #[source]
        source: SemaphoreError,
    },
}

/// Totals for a release session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReleaseSummary {
    /// Rounds that posted at least one permit
    pub rounds: usize,
    /// Permits posted across all rounds
    pub permits: u64,
    /// Lines rejected as invalid counts
    pub rejected: usize,
}

/// Post `count` independent units, stopping at the first failure
pub fn release<S: CountingSemaphore + ?Sized>(semaphore: &S, count: u32) -> Result<u32, ReleaseError> {
    for released in 0..count {
        semaphore.post().map_err(|source| ReleaseError::Partial {
            released,
            requested: count,
            source,
        })?;
    }
    Ok(count)
}

/// Prompt for counts until the sentinel `0` or end of input.
///
/// Invalid lines are reported and the prompt repeats.
pub fn run_release_loop<S, R, W>(
    semaphore: &S,
    console: &mut Console<R, W>,
) -> Result<ReleaseSummary, ReleaseError>
where
    S: CountingSemaphore + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut summary = ReleaseSummary::default();

    loop {
        let Some(line) = console.ask(RELEASE_PROMPT)? else {
            info!("End of input, stopping");
            break;
        };

        match parse_release_count(&line) {
            Ok(ReleaseRequest::Stop) => break,
            Ok(ReleaseRequest::Release(count)) => {
                release(semaphore, count)?;
                summary.rounds += 1;
                summary.permits += u64::from(count);
                info!(count, total = summary.permits, "Released {} permits", count);
            }
            Err(e) => {
                summary.rejected += 1;
                error!(input = %line, "Rejected release count: {}", e);
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
#[path = "release_tests.rs"]
mod tests;
