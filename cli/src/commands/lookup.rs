//! # Lookup Command
//!
//! File: cli/src/commands/lookup.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! `gitabot lookup` is the terminal form of `GET /verse-details`: it resolves
//! verses of one chapter and prints the same JSON array, pretty-printed.
//! Unknown verses appear as entries with an `error` field; an unknown chapter
//! fails the command.
//!
//! ## Examples
//!
//! ```bash
//! gitabot lookup 2 47
//! gitabot lookup --dataset data/dataset_english.json 2 1 2 3
//! ```
//!
use crate::core::config::{load_config, Config};
use crate::core::error::Result;
use crate::scripture::dataset::Dataset;
use crate::scripture::resolver::resolve;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;

/// # Lookup Command Arguments (`LookupArgs`)
#[derive(Parser, Debug)]
pub struct LookupArgs {
    /// Configuration file to use instead of the nearest `.gitabot.toml`.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Path of the scripture dataset JSON file.
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Chapter number.
    pub chapter: String,

    /// One or more verse numbers within the chapter.
    #[arg(required = true, num_args = 1..)]
    pub verses: Vec<String>,
}

/// # Handle Lookup Command (`handle_lookup`)
///
/// ## Errors
///
/// Returns an error if the dataset cannot be loaded, the arguments are blank,
/// or the chapter does not exist.
pub async fn handle_lookup(args: LookupArgs) -> Result<()> {
    info!("Handling lookup command with args: {:?}", args);
    let config = load_config(args.config.as_deref())?;
    let dataset = Dataset::load(&dataset_path(&config, args.dataset.as_deref()))?;
    println!("{}", render_lookup(&dataset, &args.chapter, &args.verses)?);
    Ok(())
}

/// Resolves the verses and renders the pretty-printed JSON array.
pub fn render_lookup(dataset: &Dataset, chapter: &str, verses: &[String]) -> Result<String> {
    let results = resolve(dataset, chapter, verses)?;
    Ok(serde_json::to_string_pretty(&results)?)
}

/// The `--dataset` flag when given, otherwise the configured path.
pub(crate) fn dataset_path(config: &Config, flag: Option<&Path>) -> PathBuf {
    match flag {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(&config.dataset.path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::GitabotError;
    use serde_json::{json, Value};

    fn dataset() -> Dataset {
        Dataset::from_json_str(
            r#"{ "verses": { "2": { "47": { "text": "karmaṇy evādhikāras te", "meaning": "duty" } } } }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_render_lookup_partial() {
        let rendered = render_lookup(&dataset(), "2", &["47".into(), "99".into()]).unwrap();
        let value: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value[0]["chapter"], json!("2"));
        assert_eq!(value[0]["verse"], json!("47"));
        assert_eq!(value[0]["meaning"], json!("duty"));
        assert_eq!(value[1]["error"], json!("Verse not found"));
    }

    #[test]
    fn test_render_lookup_unknown_chapter() {
        let err = render_lookup(&dataset(), "19", &["1".into()]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GitabotError>(),
            Some(GitabotError::ChapterNotFound { .. })
        ));
    }

    #[test]
    fn test_dataset_flag_wins() {
        let config = Config::default();
        assert_eq!(dataset_path(&config, None), PathBuf::from("dataset_english.json"));
        assert_eq!(
            dataset_path(&config, Some(Path::new("other.json"))),
            PathBuf::from("other.json")
        );
    }
}
