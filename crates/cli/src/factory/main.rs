// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! factory - spawn worker threads gated by a named semaphore
//!
//! Creates the semaphore, starts the pool, then blocks until SIGUSR1,
//! SIGTERM or SIGINT arrives. SIGUSR2 is ignored.

mod lifecycle;
mod signals;

use anyhow::{bail, Context, Result};
use clap::Parser;
use semgate_core::{logging, parse_thread_count, Config};
use signals::{Interruptible, Termination};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Prompt used when --threads is not given
const THREADS_PROMPT: &str = "Enter the number of threads:";

#[derive(Parser)]
#[command(
    name = "factory",
    version,
    about = "Spawn worker threads that block on a named semaphore"
)]
struct Args {
    /// Number of worker threads (prompted on stdin when omitted)
    #[arg(long, short = 'n', value_parser = parse_thread_count)]
    threads: Option<usize>,

    /// Config file (defaults to $SEMGATE_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Semaphore name
    #[arg(long)]
    name: Option<String>,

    /// Simulated work per release, e.g. "5s" or "250ms"
    #[arg(long, value_parser = humantime::parse_duration)]
    work_delay: Option<Duration>,

    /// How long to wait for workers on shutdown before abandoning them
    #[arg(long, value_parser = humantime::parse_duration)]
    shutdown_grace: Option<Duration>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Handlers go in first; a SIGINT registration failure exits nonzero
    let mut termination = signals::install().context("Sigaction failed")?;

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(name) = args.name {
        config.semaphore.name = name;
    }
    if let Some(delay) = args.work_delay {
        config.factory.work_delay = delay;
    }
    if let Some(grace) = args.shutdown_grace {
        config.factory.shutdown_grace = grace;
    }

    let _log_guard = logging::init(&config.log)?;
    info!(pid = std::process::id(), "Starting factory");

    let threads = match args.threads {
        Some(threads) => threads,
        None => match prompt_thread_count(&mut termination)? {
            Some(threads) => threads,
            None => {
                info!("Termination requested at the thread count prompt, exiting");
                return Ok(());
            }
        },
    };

    if termination.is_requested() {
        info!("Termination requested before startup, exiting");
        return Ok(());
    }

    let factory = lifecycle::startup(&config, threads)?;

    // Signal readiness to whoever launched us
    println!("READY");
    io::stdout().flush()?;
    info!(workers = factory.spawned(), "Factory ready, waiting for termination signal");

    termination.wait();
    info!("Termination requested");

    factory.shutdown();
    info!("Factory stopped");
    Ok(())
}

/// Ask for the thread count; `None` if a termination signal arrives first
fn prompt_thread_count(termination: &mut Termination) -> Result<Option<usize>> {
    println!("{}", THREADS_PROMPT);
    io::stdout().flush()?;

    let line = match termination.read_line(&mut io::stdin())? {
        Interruptible::Terminated => return Ok(None),
        Interruptible::Done(Some(line)) => line,
        Interruptible::Done(None) => bail!("no thread count entered (end of input)"),
    };
    parse_thread_count(&line)
        .map(Some)
        .context("invalid thread count")
}
