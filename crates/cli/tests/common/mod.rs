// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for driving the factory and releaser binaries.

#![allow(dead_code)]

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use semgate_core::config::{
    CONFIG_ENV, EXCLUSIVE_ENV, LOG_ENV, LOG_FILE_ENV, MODE_ENV, NAME_ENV, SHUTDOWN_GRACE_ENV,
    WORK_DELAY_ENV,
};
use semgate_core::{NamedSemaphore, SemaphoreName};
use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);
pub const EXIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Prompt the factory prints when --threads is omitted
pub const THREADS_PROMPT: &str = "Enter the number of threads:";

/// Every variable the binaries read
pub const SEMGATE_ENV: [&str; 8] = [
    CONFIG_ENV,
    NAME_ENV,
    MODE_ENV,
    EXCLUSIVE_ENV,
    WORK_DELAY_ENV,
    SHUTDOWN_GRACE_ENV,
    LOG_ENV,
    LOG_FILE_ENV,
];

/// Generate a semaphore name unique to this test run.
pub fn unique_name() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_nanos();
    let counter = COUNTER.fetch_add(1, Ordering::SeqCst);
    format!(
        "/semgate-it-{}-{}-{}",
        std::process::id(),
        timestamp % 1_000_000,
        counter
    )
}

/// True if a semaphore with this name can still be opened
pub fn semaphore_exists(name: &str) -> bool {
    let name = SemaphoreName::new(name).expect("valid name");
    match NamedSemaphore::open(&name) {
        Ok(sem) => {
            let _ = sem.close();
            true
        }
        Err(e) if e.is_not_found() => false,
        Err(e) => panic!("unexpected open error: {}", e),
    }
}

/// Base command for a binary with config isolated from the environment
pub fn command(bin: &str) -> Command {
    let mut cmd = Command::new(bin);
    for key in SEMGATE_ENV {
        cmd.env_remove(key);
    }
    // Plus any other SEMGATE_* in the test environment
    for (key, _) in std::env::vars_os() {
        if key.to_string_lossy().starts_with("SEMGATE_") {
            cmd.env_remove(key);
        }
    }
    cmd.env("RUST_LOG", "info");
    cmd
}

/// Lines captured from a child's stdout and stderr
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<String>>>);

impl Captured {
    fn follow(&self, stream: impl Read + Send + 'static) {
        let lines = Arc::clone(&self.0);
        thread::spawn(move || {
            for line in BufReader::new(stream).lines().map_while(Result::ok) {
                lines.lock().unwrap().push(line);
            }
        });
    }

    pub fn count(&self, needle: &str) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }

    pub fn wait_for(&self, needle: &str, at_least: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.count(needle) >= at_least {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
        }
        self.count(needle) >= at_least
    }

    pub fn dump(&self) -> String {
        self.0.lock().unwrap().join("\n")
    }
}

/// A running factory process; killed and its semaphore unlinked on drop
pub struct Factory {
    pub name: String,
    child: Child,
    // Held open so the factory never sees end of input
    stdin: Option<ChildStdin>,
    pub output: Captured,
}

impl Factory {
    /// Start with `--threads` and wait for READY
    pub fn start(name: &str, threads: usize, work_delay: &str) -> Self {
        let mut cmd = command(env!("CARGO_BIN_EXE_factory"));
        cmd.args(["--name", name, "--work-delay", work_delay])
            .args(["--threads", &threads.to_string()])
            .stdin(Stdio::null());
        let factory = Self::spawn(name, cmd, None);
        factory.await_ready();
        factory
    }

    /// Start without `--threads`, answering the prompt with `input`
    pub fn start_with_prompt(name: &str, input: &str, work_delay: &str) -> Self {
        let mut cmd = command(env!("CARGO_BIN_EXE_factory"));
        cmd.args(["--name", name, "--work-delay", work_delay])
            .stdin(Stdio::piped());
        let mut factory = Self::spawn(name, cmd, Some(input));
        drop(factory.stdin.take());
        factory.await_ready();
        factory
    }

    /// Start without `--threads` and leave it waiting at the prompt
    pub fn at_prompt(name: &str) -> Self {
        let mut cmd = command(env!("CARGO_BIN_EXE_factory"));
        cmd.args(["--name", name]).stdin(Stdio::piped());
        let factory = Self::spawn(name, cmd, Some(""));
        assert!(
            factory.output.wait_for(THREADS_PROMPT, 1, STARTUP_TIMEOUT),
            "factory never prompted:\n{}",
            factory.output.dump()
        );
        factory
    }

    fn spawn(name: &str, mut cmd: Command, input: Option<&str>) -> Self {
        let mut child = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn factory");

        let stdin = input.map(|input| {
            let mut stdin = child.stdin.take().expect("stdin piped");
            stdin.write_all(input.as_bytes()).expect("write stdin");
            stdin
        });

        let output = Captured::default();
        output.follow(child.stdout.take().expect("stdout piped"));
        output.follow(child.stderr.take().expect("stderr piped"));

        Self {
            name: name.to_string(),
            child,
            stdin,
            output,
        }
    }

    fn await_ready(&self) {
        assert!(
            self.output.wait_for("READY", 1, STARTUP_TIMEOUT),
            "factory never became ready:\n{}",
            self.output.dump()
        );
    }

    pub fn pid(&self) -> Pid {
        Pid::from_raw(self.child.id() as i32)
    }

    pub fn signal(&self, signal: Signal) {
        kill(self.pid(), signal).expect("Failed to signal factory");
    }

    pub fn is_running(&mut self) -> bool {
        self.child.try_wait().expect("try_wait").is_none()
    }

    /// Wait for exit, failing the test after `timeout`
    pub fn wait_exit(&mut self, timeout: Duration) -> ExitStatus {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.child.try_wait().expect("try_wait") {
                return status;
            }
            if Instant::now() >= deadline {
                panic!(
                    "factory did not exit within {:?}:\n{}",
                    timeout,
                    self.output.dump()
                );
            }
            thread::sleep(Duration::from_millis(20));
        }
    }
}

impl Drop for Factory {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
        if let Ok(name) = SemaphoreName::new(self.name.as_str()) {
            let _ = NamedSemaphore::unlink(&name);
        }
    }
}

/// Releaser command for `name`, fed `input` on stdin
pub fn releaser(name: &str, input: &str) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::from_std(command(env!("CARGO_BIN_EXE_releaser")));
    cmd.args(["--name", name])
        .write_stdin(input.to_string())
        .timeout(Duration::from_secs(10));
    cmd
}
