//! # Verse Dataset Store
//!
//! File: cli/src/scripture/dataset.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Loads the scripture dataset (a JSON document with a top-level `verses`
//! object keyed by chapter, then by verse) once at startup and serves
//! read-only lookups for the rest of the process lifetime.
//!
//! ```json
//! { "verses": { "2": { "47": { "text": "...", "transliteration": "...",
//!                              "meaning": { "english": "..." },
//!                              "word_meanings": "..." } } } }
//! ```
//!
//! Chapter and verse keys are always stored as strings and normalized with
//! [`normalize_key`], so "02" and "2" address the same chapter.
//!
use crate::core::error::{GitabotError, Result};
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Text that is either a single string or keyed by language.
///
/// Any other JSON shape is kept verbatim so API output mirrors the dataset,
/// but contributes no renderable text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    ByLanguage(BTreeMap<String, String>),
    Other(serde_json::Value),
}

impl LocalizedText {
    /// Returns `(language label, text)` pairs for the requested languages, in
    /// the requested order. A plain string yields one unlabeled entry.
    pub fn select<'a>(&'a self, languages: &[String]) -> Vec<(Option<&'a str>, &'a str)> {
        match self {
            LocalizedText::Plain(text) if !text.trim().is_empty() => vec![(None, text.as_str())],
            LocalizedText::Plain(_) | LocalizedText::Other(_) => Vec::new(),
            LocalizedText::ByLanguage(map) => languages
                .iter()
                .filter_map(|lang| {
                    map.iter()
                        .find(|(key, _)| key.eq_ignore_ascii_case(lang.trim()))
                        .filter(|(_, text)| !text.trim().is_empty())
                        .map(|(key, text)| (Some(key.as_str()), text.as_str()))
                })
                .collect(),
        }
    }

    /// The selected texts joined by a single space.
    pub fn joined(&self, languages: &[String]) -> String {
        self.select(languages)
            .into_iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One verse as stored in the dataset. Every field is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VerseRecord {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub meaning: Option<LocalizedText>,
    #[serde(default)]
    pub transliteration: Option<String>,
    #[serde(default)]
    pub word_meanings: Option<LocalizedText>,
}

impl VerseRecord {
    /// Meaning text in the given languages, or an empty string.
    pub fn meaning_text(&self, languages: &[String]) -> String {
        self.meaning
            .as_ref()
            .map(|m| m.joined(languages))
            .unwrap_or_default()
    }
}

/// A borrowed view of one dataset entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerseEntry<'a> {
    pub chapter: &'a str,
    pub verse: &'a str,
    pub record: &'a VerseRecord,
}

/// All verses of one chapter, with keys kept in canonical order.
#[derive(Debug, Clone, Default)]
pub struct Chapter {
    verses: HashMap<String, VerseRecord>,
    order: Vec<String>,
}

impl Chapter {
    pub fn get(&self, verse: &str) -> Option<&VerseRecord> {
        self.verses.get(&normalize_key(verse))
    }

    /// Verse keys in canonical order.
    pub fn verse_keys(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// The immutable in-memory dataset.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    chapters: HashMap<String, Chapter>,
    order: Vec<String>,
}

#[derive(Deserialize)]
struct RawDataset {
    #[serde(default)]
    verses: HashMap<String, HashMap<String, VerseRecord>>,
}

impl Dataset {
    /// Reads and parses the dataset file.
    ///
    /// ## Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid dataset document.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset file: {}", path.display()))?;
        let dataset = Self::from_json_str(&content)
            .with_context(|| format!("Failed to load dataset from {}", path.display()))?;
        info!(
            "Loaded {} verses in {} chapters from {}",
            dataset.verse_count(),
            dataset.chapter_count(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: RawDataset = serde_json::from_str(content)
            .map_err(|e| anyhow!(GitabotError::Dataset(format!("invalid JSON: {}", e))))?;
        Ok(Self::from_raw(raw.verses))
    }

    fn from_raw(raw: HashMap<String, HashMap<String, VerseRecord>>) -> Self {
        let mut chapters: HashMap<String, Chapter> = HashMap::new();
        for (chapter_key, verses) in raw {
            let chapter_key = normalize_key(&chapter_key);
            let chapter = chapters.entry(chapter_key.clone()).or_default();
            for (verse_key, record) in verses {
                let verse_key = normalize_key(&verse_key);
                if chapter.verses.insert(verse_key.clone(), record).is_some() {
                    warn!(
                        "Duplicate verse key {}.{} after normalization; keeping one entry",
                        chapter_key, verse_key
                    );
                }
            }
        }
        for chapter in chapters.values_mut() {
            chapter.order = chapter.verses.keys().cloned().collect();
            chapter.order.sort_by(|a, b| compare_keys(a, b));
        }
        let mut order: Vec<String> = chapters.keys().cloned().collect();
        order.sort_by(|a, b| compare_keys(a, b));
        Self { chapters, order }
    }

    pub fn chapter(&self, chapter: &str) -> Option<&Chapter> {
        self.chapters.get(&normalize_key(chapter))
    }

    pub fn verse(&self, chapter: &str, verse: &str) -> Option<&VerseRecord> {
        self.chapter(chapter).and_then(|c| c.get(verse))
    }

    /// Every verse in canonical order (chapter, then verse).
    pub fn iter(&self) -> impl Iterator<Item = VerseEntry<'_>> + '_ {
        self.order.iter().flat_map(move |chapter_key| {
            let chapter = &self.chapters[chapter_key];
            chapter.order.iter().map(move |verse_key| VerseEntry {
                chapter: chapter_key.as_str(),
                verse: verse_key.as_str(),
                record: &chapter.verses[verse_key],
            })
        })
    }

    /// Looks up an entry, returning keys borrowed from the dataset.
    pub fn entry(&self, chapter: &str, verse: &str) -> Option<VerseEntry<'_>> {
        let (chapter_key, chapter_data) = self.chapters.get_key_value(&normalize_key(chapter))?;
        let (verse_key, record) = chapter_data.verses.get_key_value(&normalize_key(verse))?;
        Some(VerseEntry {
            chapter: chapter_key,
            verse: verse_key,
            record,
        })
    }

    pub fn chapter_count(&self) -> usize {
        self.order.len()
    }

    pub fn verse_count(&self) -> usize {
        self.chapters.values().map(Chapter::len).sum()
    }
}

/// Trims the key and strips leading zeros from purely numeric keys.
pub fn normalize_key(key: &str) -> String {
    let trimmed = key.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let stripped = trimmed.trim_start_matches('0');
        if stripped.is_empty() {
            "0".to_string()
        } else {
            stripped.to_string()
        }
    } else {
        trimmed.to_string()
    }
}

/// Numeric keys ascend numerically and precede non-numeric keys.
fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
