//! # Mood Table
//!
//! File: cli/src/retrieval/mood.rs
//! Author: Christi Mahu
//!
//! A small, fixed vocabulary of mood labels, each mapped to keywords. A verse
//! matches a mood when its meaning text contains any of the mood's keywords
//! (case-insensitive substring match).
//!
use crate::scripture::dataset::{Dataset, VerseEntry};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

const BUILTIN_MOODS: &[(&str, &[&str])] = &[
    ("peace", &["peace", "calm", "tranquil", "serene", "content"]),
    ("anxious", &["anxiety", "worry", "fear", "disturb", "restless"]),
    ("angry", &["anger", "wrath", "rage", "hatred"]),
    ("sad", &["grief", "sorrow", "lament", "misery", "distress"]),
    ("fear", &["fear", "fearless", "afraid", "courage"]),
    ("confused", &["confus", "delusion", "doubt", "bewilder", "ignorance"]),
    ("lonely", &["alone", "friend", "dear to me", "devotee"]),
    ("motivated", &["duty", "action", "work", "strive", "arise"]),
    ("love", &["love", "devotion", "affection", "dear"]),
];

/// Mood label -> lower-cased keywords. Never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodTable {
    moods: BTreeMap<String, Vec<String>>,
}

impl Default for MoodTable {
    fn default() -> Self {
        Self::from_map(
            BUILTIN_MOODS
                .iter()
                .map(|(label, keywords)| {
                    (
                        label.to_string(),
                        keywords.iter().map(|k| k.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }
}

impl MoodTable {
    /// Builds a table from configuration; labels and keywords are normalized
    /// (trimmed, lower-cased) and blank keywords dropped.
    pub fn from_map(moods: BTreeMap<String, Vec<String>>) -> Self {
        let moods = moods
            .into_iter()
            .map(|(label, keywords)| {
                let keywords = keywords
                    .into_iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (label.trim().to_lowercase(), keywords)
            })
            .collect();
        Self { moods }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.moods.keys().map(String::as_str)
    }

    /// Keywords of the mood named by `input` (trimmed, case-insensitive).
    pub fn keywords(&self, input: &str) -> Option<&[String]> {
        self.moods
            .get(&input.trim().to_lowercase())
            .map(Vec::as_slice)
    }

    pub fn is_mood(&self, input: &str) -> bool {
        self.keywords(input).is_some()
    }

    /// Every verse whose meaning text (in `languages`) contains one of the
    /// mood's keywords, in dataset order. Empty for unknown moods.
    pub fn matching_verses<'a>(
        &self,
        mood: &str,
        dataset: &'a Dataset,
        languages: &[String],
    ) -> Vec<VerseEntry<'a>> {
        let Some(keywords) = self.keywords(mood) else {
            return Vec::new();
        };
        dataset
            .iter()
            .filter(|entry| {
                let meaning = entry.record.meaning_text(languages).to_lowercase();
                keywords.iter().any(|k| meaning.contains(k.as_str()))
            })
            .collect()
    }

    /// Up to `limit` matching verses sampled without replacement.
    pub fn sample<'a, R: Rng + ?Sized>(
        &self,
        mood: &str,
        dataset: &'a Dataset,
        languages: &[String],
        limit: usize,
        rng: &mut R,
    ) -> Vec<VerseEntry<'a>> {
        let matches = self.matching_verses(mood, dataset, languages);
        matches.choose_multiple(rng, limit).copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dataset() -> Dataset {
        Dataset::from_json_str(
            r#"{ "verses": { "2": {
                "1": { "meaning": "He who is free from all desires attains PEACE." },
                "2": { "meaning": "The calm mind is steady." },
                "3": { "meaning": "Perform your duty." },
                "4": { "meaning": { "english": "A tranquil sage", "hindi": "x" } },
                "5": { "meaning": "Peaceful are the wise." },
                "6": { "text": "peace (text only, no meaning)" }
            } } }"#,
        )
        .unwrap()
    }

    fn english() -> Vec<String> {
        vec!["english".to_string()]
    }

    #[test]
    fn test_builtin_labels() {
        let table = MoodTable::default();
        assert!(table.is_mood("peace"));
        assert!(table.is_mood("  PEACE "));
        assert!(!table.is_mood("joy"));
        assert!(table.labels().any(|l| l == "anxious"));
    }

    #[test]
    fn test_matching_is_case_insensitive_substring_on_meaning() {
        let ds = dataset();
        let table = MoodTable::default();
        let verses: Vec<&str> = table
            .matching_verses("peace", &ds, &english())
            .iter()
            .map(|e| e.verse)
            .collect();
        assert_eq!(verses, vec!["1", "2", "4", "5"]);
    }

    #[test]
    fn test_sample_is_bounded_and_only_matches() {
        let ds = dataset();
        let table = MoodTable::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let sample = table.sample("peace", &ds, &english(), 3, &mut rng);
            assert_eq!(sample.len(), 3);
            for entry in &sample {
                let meaning = entry.record.meaning_text(&english()).to_lowercase();
                assert!(["peace", "calm", "tranquil", "serene", "content"]
                    .iter()
                    .any(|k| meaning.contains(k)));
            }
            let mut keys: Vec<&str> = sample.iter().map(|e| e.verse).collect();
            keys.sort();
            keys.dedup();
            assert_eq!(keys.len(), 3, "sampled without replacement");
        }
    }

    #[test]
    fn test_configured_table_and_no_matches() {
        let ds = dataset();
        let table = MoodTable::from_map(BTreeMap::from([(
            " Joy ".to_string(),
            vec!["BLISS".to_string(), " ".to_string()],
        )]));
        assert_eq!(table.keywords("joy").unwrap(), &["bliss".to_string()]);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(table.sample("joy", &ds, &english(), 3, &mut rng).is_empty());
        assert!(table.sample("peace", &ds, &english(), 3, &mut rng).is_empty());
    }
}
