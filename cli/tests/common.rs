//! # gitabot Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Shared helpers for the integration tests in `cli/tests/`: a command builder
//! for the compiled `gitabot` binary that is isolated from the developer's own
//! configuration, and a small fixture dataset.
//!

// Each test crate uses a different subset of these helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

/// Chapters 1 and 2 with a handful of verses. Only 2.47 mentions "peace".
pub const FIXTURE_DATASET: &str = r#"{
  "verses": {
    "1": {
      "1": {
        "text": "dharma-kṣetre kuru-kṣetre",
        "transliteration": "dharma-kshetre kuru-kshetre",
        "meaning": { "english": "Dhritarashtra asked about the armies at Kurukshetra", "hindi": "धृतराष्ट्र ने पूछा" },
        "word_meanings": { "english": "dharma-kṣetre: in the place of pilgrimage" }
      },
      "2": { "text": "dṛṣṭvā tu pāṇḍavānīkaṁ", "meaning": "Sanjaya describes the army" }
    },
    "2": {
      "10": { "text": "tam uvāca hṛṣīkeśaḥ", "meaning": "Krishna smiled and spoke" },
      "11": { "text": "aśocyān anvaśocas tvaṁ", "meaning": "The wise lament neither for the living nor the dead" },
      "47": { "text": "karmaṇy evādhikāras te", "meaning": "Do your duty without attachment and find peace" }
    }
  }
}"#;

/// # Get gitabot Command (`gitabot_cmd`)
///
/// A command for the compiled `gitabot` binary.
///
/// ## Panics
/// Panics if the binary cannot be found via `Command::cargo_bin`.
pub fn gitabot_cmd() -> Command {
    Command::cargo_bin("gitabot").expect("Failed to find gitabot binary for testing")
}

/// A `gitabot` command running in `dir`, with user-level configuration and
/// secrets from the environment masked out.
pub fn isolated_cmd(dir: &Path) -> Command {
    let mut cmd = gitabot_cmd();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("WHATSAPP_VERIFY_TOKEN")
        .env_remove("WHATSAPP_ACCESS_TOKEN")
        .env_remove("WHATSAPP_PHONE_NUMBER_ID")
        .env_remove("EMBEDDING_API_KEY");
    cmd
}

/// Writes the fixture dataset into `dir` and returns its path.
pub fn write_dataset(dir: &Path) -> PathBuf {
    let path = dir.join("dataset_english.json");
    fs::write(&path, FIXTURE_DATASET).expect("Failed to write fixture dataset");
    path
}
