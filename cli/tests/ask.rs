//! # gitabot Ask Integration Tests
//!
//! File: cli/tests/ask.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Drives the chat router through `gitabot ask`, including the user-state
//! file that lets `next` continue across separate runs.
//!
mod common;
use common::*;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_ask_greeting_shows_help() {
    let dir = tempdir().unwrap();
    write_dataset(dir.path());
    isolated_cmd(dir.path())
        .args(["ask", "Namaste"])
        .assert()
        .success()
        .stdout(predicate::str::contains("*random*"))
        .stdout(predicate::str::contains("*next*"));
}

#[test]
fn test_ask_reference_formats_verse() {
    let dir = tempdir().unwrap();
    write_dataset(dir.path());
    isolated_cmd(dir.path())
        .args(["ask", "1.1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("📖 *Bhagavad Gita 1.1*"))
        .stdout(predicate::str::contains("_dharma-kshetre kuru-kshetre_"))
        .stdout(predicate::str::contains("🌼 *Meaning (English):*"));
}

#[test]
fn test_next_continues_across_runs() {
    let dir = tempdir().unwrap();
    write_dataset(dir.path());

    isolated_cmd(dir.path())
        .args(["ask", "--user", "15550001111", "2.10"])
        .assert()
        .success();

    let state: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("user_state.json")).unwrap())
            .unwrap();
    assert_eq!(state["15550001111"], serde_json::json!(["2", "10"]));

    isolated_cmd(dir.path())
        .args(["ask", "--user", "15550001111", "next"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bhagavad Gita 2.11"));

    isolated_cmd(dir.path())
        .args(["ask", "--user", "15550001111", "next"])
        .assert()
        .success()
        .stdout(predicate::str::contains("You've reached the end of chapter 2."));
}

#[test]
fn test_next_without_history() {
    let dir = tempdir().unwrap();
    write_dataset(dir.path());
    isolated_cmd(dir.path())
        .args(["ask", "next"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Please start with a verse first"));
}

#[test]
fn test_ask_mood_and_multiword_text() {
    let dir = tempdir().unwrap();
    write_dataset(dir.path());
    isolated_cmd(dir.path())
        .args(["ask", "peace"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bhagavad Gita 2.47"));

    isolated_cmd(dir.path())
        .args(["ask", "who", "am", "I"])
        .assert()
        .success()
        .stdout(predicate::str::contains("I couldn't find verses for that."));
}

#[test]
fn test_ask_with_custom_state_path() {
    let dir = tempdir().unwrap();
    write_dataset(dir.path());
    let state = dir.path().join("nested").join("state.json");
    isolated_cmd(dir.path())
        .args(["ask", "--state"])
        .arg(&state)
        .arg("2.47")
        .assert()
        .success();
    assert!(state.is_file());
    assert!(!dir.path().join("user_state.json").exists());
}

#[test]
fn test_ask_unknown_chapter_reference() {
    let dir = tempdir().unwrap();
    write_dataset(dir.path());
    isolated_cmd(dir.path())
        .args(["ask", "19.1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Chapter 19 not found."));
}
