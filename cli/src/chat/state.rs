//! # User State Store
//!
//! File: cli/src/chat/state.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Remembers the last verse each chat user viewed, so that `next` can continue
//! from it. The store is the single owner of the map: every access goes through
//! an async mutex, and each read-modify-write runs to completion (including the
//! write to disk) before the next one starts. Concurrent `next` requests for the
//! same user therefore never lose updates.
//!
//! ## Persistence
//!
//! The whole map is rewritten after each mutation as
//! `{"<user>": ["<chapter>", "<verse>"]}`. Writes go to a temporary file in the
//! target directory which is then renamed over the old file, so a crash leaves
//! either the previous or the new content, never a partial file.
//!
use crate::core::error::{GitabotError, Result};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// A (chapter, verse) pair, stored as a two-element array on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(KeyRepr, KeyRepr)", into = "(String, String)")]
pub struct VersePosition {
    pub chapter: String,
    pub verse: String,
}

impl VersePosition {
    pub fn new(chapter: impl Into<String>, verse: impl Into<String>) -> Self {
        Self {
            chapter: chapter.into(),
            verse: verse.into(),
        }
    }
}

/// Older state files may hold numbers instead of strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum KeyRepr {
    Text(String),
    Number(u64),
}

impl From<KeyRepr> for String {
    fn from(key: KeyRepr) -> Self {
        match key {
            KeyRepr::Text(s) => s,
            KeyRepr::Number(n) => n.to_string(),
        }
    }
}

impl From<(KeyRepr, KeyRepr)> for VersePosition {
    fn from((chapter, verse): (KeyRepr, KeyRepr)) -> Self {
        Self::new(String::from(chapter), String::from(verse))
    }
}

impl From<VersePosition> for (String, String) {
    fn from(pos: VersePosition) -> Self {
        (pos.chapter, pos.verse)
    }
}

/// Serialized, file-backed map from user id to last viewed verse.
#[derive(Debug)]
pub struct UserStateStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, VersePosition>>,
}

impl UserStateStore {
    /// Loads the state file; a missing file starts an empty store.
    ///
    /// ## Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read user state file: {}", path.display()))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    anyhow!(GitabotError::State(format!(
                        "invalid state file {}: {}",
                        path.display(),
                        e
                    )))
                })?
            }
        } else {
            debug!("No user state file at {}; starting empty", path.display());
            BTreeMap::new()
        };
        info!(
            "Loaded state for {} user(s) from {}",
            entries.len(),
            path.display()
        );
        Ok(Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, user: &str) -> Option<VersePosition> {
        self.entries.lock().await.get(user).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Sets the user's position and persists the store.
    pub async fn record(&self, user: &str, position: VersePosition) -> Result<()> {
        self.update(user, |_| (Some(position), ())).await
    }

    /// Runs `step` on the user's current position while holding the store
    /// lock. If `step` returns a new position it is persisted and then stored
    /// before the lock is released; a failed write leaves the map unchanged.
    pub async fn update<T, F>(&self, user: &str, step: F) -> Result<T>
    where
        F: FnOnce(Option<&VersePosition>) -> (Option<VersePosition>, T),
    {
        let mut entries = self.entries.lock().await;
        let (next, outcome) = step(entries.get(user));
        if let Some(position) = next {
            debug!("User {} -> {}.{}", user, position.chapter, position.verse);
            let mut updated = entries.clone();
            updated.insert(user.to_string(), position);
            let json = serde_json::to_string_pretty(&updated)
                .context("Failed to serialize user state")?;
            let path = self.path.clone();
            tokio::task::spawn_blocking(move || write_atomically(&path, &json))
                .await
                .context("User state writer task failed")??;
            // Only a persisted position becomes visible.
            *entries = updated;
        }
        Ok(outcome)
    }
}

fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create state directory {}", parent.display()))?;
    let mut temp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    temp.write_all(content.as_bytes())
        .context("Failed to write user state")?;
    temp.persist(path).map_err(|e| {
        anyhow!(GitabotError::State(format!(
            "failed to replace {}: {}",
            path.display(),
            e.error
        )))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let store = UserStateStore::load(&dir.path().join("state.json")).unwrap();
        assert!(store.is_empty().await);
        assert_eq!(store.get("123").await, None);
    }

    #[tokio::test]
    async fn test_record_persists_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let store = UserStateStore::load(&path).unwrap();
        store
            .record("15550001111", VersePosition::new("2", "10"))
            .await
            .unwrap();

        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, serde_json::json!({ "15550001111": ["2", "10"] }));

        let reloaded = UserStateStore::load(&path).unwrap();
        assert_eq!(
            reloaded.get("15550001111").await,
            Some(VersePosition::new("2", "10"))
        );
    }

    #[tokio::test]
    async fn test_numeric_pairs_are_accepted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{ "u1": [3, 21], "u2": ["4", "1"] }"#).unwrap();
        let store = UserStateStore::load(&path).unwrap();
        assert_eq!(store.get("u1").await, Some(VersePosition::new("3", "21")));
        assert_eq!(store.len().await, 2);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "[1, 2").unwrap();
        let err = UserStateStore::load(&path).unwrap_err();
        assert!(err.to_string().contains("invalid state file"));
    }

    #[tokio::test]
    async fn test_update_without_change_does_not_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = UserStateStore::load(&path).unwrap();
        let seen = store
            .update("u", |current| (None, current.cloned()))
            .await
            .unwrap();
        assert_eq!(seen, None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_position() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{ "u": ["2", "10"] }"#).unwrap();
        let store = UserStateStore::load(&path).unwrap();

        // A non-empty directory cannot be replaced by a file.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        fs::write(path.join("blocker"), "x").unwrap();

        let result = store.record("u", VersePosition::new("2", "11")).await;
        assert!(result.is_err());
        assert_eq!(store.get("u").await, Some(VersePosition::new("2", "10")));
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_serialized() {
        let dir = tempdir().unwrap();
        let store = Arc::new(UserStateStore::load(&dir.path().join("state.json")).unwrap());
        store.record("u", VersePosition::new("1", "0")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .update("u", |current| {
                        let verse: u32 = current.unwrap().verse.parse().unwrap();
                        (Some(VersePosition::new("1", (verse + 1).to_string())), ())
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.get("u").await, Some(VersePosition::new("1", "20")));
    }
}
