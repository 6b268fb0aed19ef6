// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::thread;
use std::time::Instant;

#[test]
fn token_starts_untriggered() {
    let token = ShutdownToken::new();
    assert!(!token.is_triggered());
    assert!(!token.wait_timeout(Duration::from_millis(10)));
}

#[test]
fn trigger_is_set_once() {
    let token = ShutdownToken::new();
    assert!(token.trigger());
    assert!(!token.trigger());
    assert!(token.is_triggered());
}

#[test]
fn clones_share_state() {
    let token = ShutdownToken::new();
    let clone = token.clone();
    clone.trigger();
    assert!(token.is_triggered());
}

#[test]
fn wait_timeout_returns_early_on_trigger() {
    let token = ShutdownToken::new();
    let trigger = {
        let token = token.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            token.trigger();
        })
    };

    let start = Instant::now();
    assert!(token.wait_timeout(Duration::from_secs(30)));
    assert!(start.elapsed() < Duration::from_secs(10));
    trigger.join().unwrap();
}

#[test]
fn clone_wakes_when_original_triggers() {
    let token = ShutdownToken::new();
    let waiter = {
        let token = token.clone();
        thread::spawn(move || token.wait_timeout(Duration::from_secs(30)))
    };

    token.trigger();
    assert!(waiter.join().unwrap());
}
