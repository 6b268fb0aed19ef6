// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! releaser - wake factory workers by posting the shared semaphore
//!
//! Opens (never creates) the factory's semaphore, then posts it as many
//! times as the operator asks until `0` is entered. The releaser never
//! unlinks the semaphore; that belongs to the factory.

use anyhow::{Context, Result};
use clap::Parser;
use nix::unistd::getppid;
use semgate_core::{logging, run_release_loop, Config, Console, NamedSemaphore};
use std::io;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(
    name = "releaser",
    version,
    about = "Release blocked factory workers through the named semaphore"
)]
struct Args {
    /// Config file (defaults to $SEMGATE_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Semaphore name
    #[arg(long)]
    name: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(name) = args.name {
        config.semaphore.name = name;
    }

    let _log_guard = logging::init(&config.log)?;

    let name = config.semaphore_name()?;
    let semaphore = match NamedSemaphore::open(&name) {
        Ok(semaphore) => semaphore,
        Err(e) => {
            if e.is_not_found() {
                error!(name = %name, "Semaphore {} not found; start the factory first", name);
            } else {
                error!(name = %name, error = %e, "Failed to open semaphore");
            }
            return Err(e).with_context(|| format!("cannot open semaphore {}", name));
        }
    };
    info!(name = %name, "Opened semaphore {}", name);

    println!("Parent PID: {}", getppid());

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());
    let result = run_release_loop(&semaphore, &mut console);

    // Close before reporting so the handle is released on every path
    if let Err(e) = semaphore.close() {
        warn!(error = %e, "Failed to close semaphore");
    }

    let summary = result.context("release loop failed")?;
    info!(
        rounds = summary.rounds,
        permits = summary.permits,
        rejected = summary.rejected,
        "Releaser finished"
    );
    Ok(())
}
