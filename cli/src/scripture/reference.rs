//! # Verse Reference Parsing
//!
//! File: cli/src/scripture/reference.rs
//! Author: Christi Mahu
//!
//! Parses chat messages made only of `chapter.verse[,verse...]` groups, e.g.
//! `"2.47"`, `"2.1,2 3.4"` or `"18.66, 67"`.
//!
use regex::Regex;
use std::sync::LazyLock;

static GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.(\d+(?:,\d+)*)$").expect("reference pattern is valid")
});
static COMMA_SPACING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,\s*").expect("comma pattern is valid"));

/// A single chapter/verse pair as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseRef {
    pub chapter: String,
    pub verse: String,
}

impl VerseRef {
    pub fn new(chapter: impl Into<String>, verse: impl Into<String>) -> Self {
        Self {
            chapter: chapter.into(),
            verse: verse.into(),
        }
    }
}

/// Returns every referenced verse in message order, or `None` when the
/// message is not purely a list of references.
pub fn parse_references(input: &str) -> Option<Vec<VerseRef>> {
    let compact = COMMA_SPACING.replace_all(input.trim(), ",");
    let mut refs = Vec::new();
    for token in compact.split_whitespace() {
        let caps = GROUP.captures(token)?;
        let chapter = &caps[1];
        refs.extend(caps[2].split(',').map(|verse| VerseRef::new(chapter, verse)));
    }
    if refs.is_empty() {
        None
    } else {
        Some(refs)
    }
}
