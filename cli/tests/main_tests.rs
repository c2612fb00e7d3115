//! # gitabot CLI Main Integration Tests
//!
//! File: cli/tests/main_tests.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Top-level CLI behavior: help, version, and argument errors.
//!
mod common;
use common::*;
use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    gitabot_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("lookup"))
        .stdout(predicate::str::contains("ask"));
}

#[test]
fn test_version_flag() {
    gitabot_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_subcommand_fails() {
    gitabot_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_lookup_requires_a_verse() {
    gitabot_cmd()
        .args(["lookup", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("VERSES"));
}

#[test]
fn test_serve_rejects_invalid_port() {
    gitabot_cmd()
        .args(["serve", "--port", "not-a-port"])
        .assert()
        .failure();
}
