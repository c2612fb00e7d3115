//! # Verse Resolver
//!
//! File: cli/src/scripture/resolver.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Resolves a chapter key plus an ordered list of verse keys into one result
//! per requested verse, in request order. The chapter is checked once for the
//! whole request; a missing verse inside an existing chapter only marks its own
//! result, siblings still resolve. Repeated verse keys produce repeated results.
//!
//! Results borrow the dataset records; serialized, a found verse looks like
//! `{"chapter","verse","text","meaning","transliteration","word_meanings"}`
//! and a missing one like `{"chapter","verse","error":"Verse not found"}`.
//!
use super::dataset::{Dataset, VerseEntry, VerseRecord};
use crate::core::error::GitabotError;
use serde::Serialize;

/// Marker value used in per-verse not-found results.
pub const VERSE_NOT_FOUND: &str = "Verse not found";

/// One resolved verse, echoing the keys as requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerseDetails<'a> {
    pub chapter: String,
    pub verse: String,
    #[serde(flatten)]
    pub record: &'a VerseRecord,
}

/// A requested verse that does not exist in the chapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingVerse {
    pub chapter: String,
    pub verse: String,
    pub error: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VerseResult<'a> {
    Found(VerseDetails<'a>),
    Missing(MissingVerse),
}

impl VerseResult<'_> {
    pub fn is_found(&self) -> bool {
        matches!(self, VerseResult::Found(_))
    }
}

/// # Resolve Verses (`resolve`)
///
/// ## Errors
///
/// - `GitabotError::MissingParameters` if the chapter is blank or no verse
///   key was given. A blank key inside the list gets its own not-found entry.
/// - `GitabotError::ChapterNotFound` if the chapter is absent or has no
///   verses (whole request).
pub fn resolve<'a, S: AsRef<str>>(
    dataset: &'a Dataset,
    chapter: &str,
    verses: &[S],
) -> Result<Vec<VerseResult<'a>>, GitabotError> {
    let chapter = chapter.trim();
    let verses: Vec<&str> = verses.iter().map(|v| v.as_ref().trim()).collect();
    if chapter.is_empty() || verses.is_empty() {
        return Err(GitabotError::MissingParameters);
    }

    let chapter_data = dataset
        .chapter(chapter)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| GitabotError::ChapterNotFound {
            chapter: chapter.to_string(),
        })?;

    Ok(verses
        .into_iter()
        .map(|verse| match chapter_data.get(verse) {
            Some(record) => VerseResult::Found(VerseDetails {
                chapter: chapter.to_string(),
                verse: verse.to_string(),
                record,
            }),
            None => VerseResult::Missing(MissingVerse {
                chapter: chapter.to_string(),
                verse: verse.to_string(),
                error: VERSE_NOT_FOUND,
            }),
        })
        .collect())
}

/// Resolves a single verse, distinguishing a missing chapter from a missing verse.
pub fn resolve_one<'a>(
    dataset: &'a Dataset,
    chapter: &str,
    verse: &str,
) -> Result<VerseEntry<'a>, GitabotError> {
    if dataset.chapter(chapter).map_or(true, |c| c.is_empty()) {
        return Err(GitabotError::ChapterNotFound {
            chapter: chapter.trim().to_string(),
        });
    }
    dataset
        .entry(chapter, verse)
        .ok_or_else(|| GitabotError::VerseNotFound {
            chapter: chapter.trim().to_string(),
            verse: verse.trim().to_string(),
        })
}
