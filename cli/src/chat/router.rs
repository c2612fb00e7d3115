//! # Chat Command Router
//!
//! File: cli/src/chat/router.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Turns one inbound chat message into one reply. The normalized input
//! (trimmed, lower-cased) is dispatched in a fixed precedence order:
//!
//! 1. greeting / help keywords → help text
//! 2. `random` → a random verse (bounded retries)
//! 3. `daily` / `today` → the verse of the day (same verse for everyone on a given day)
//! 4. `next` → the verse after the user's last viewed verse
//! 5. direct references (`2.47`, `2.1,2 3.4`) → those verses, capped
//! 6. a mood label → mood tier, falling through to semantic search
//! 7. anything else → semantic search
//!
//! Because mood labels are recognized before the fallback, typing a mood
//! always gets mood-table behavior first.
//!
//! Every single-verse answer (random, daily, next, the last resolved direct
//! reference) becomes the user's position for `next`.
//!
use super::state::{UserStateStore, VersePosition};
use crate::core::config::BotConfig;
use crate::core::error::{GitabotError, Result};
use crate::retrieval::mood::MoodTable;
use crate::retrieval::{Retrieval, Retriever};
use crate::scripture::dataset::{Chapter, Dataset, VerseEntry};
use crate::scripture::formatter::{VerseFormatter, VERSE_SEPARATOR};
use crate::scripture::reference::{parse_references, VerseRef};
use crate::scripture::resolver::resolve_one;
use chrono::Datelike;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

const HELP_KEYWORDS: &[&str] = &["hi", "hello", "hey", "namaste", "help", "start", "menu"];

pub const ERROR_REPLY: &str = "Sorry, there was an error processing your request.";
pub const START_PROMPT: &str = "Please start with a verse first (for example 2.47).";
pub const RANDOM_FAILED: &str = "Could not find a random verse right now, please try again.";

/// A classified chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Random,
    Daily,
    Next,
    References(Vec<VerseRef>),
    Mood(String),
    Ask(String),
}

impl Command {
    /// Classifies `input` using the precedence described in the module docs.
    pub fn parse(input: &str, moods: &MoodTable) -> Self {
        let normalized = input.trim().to_lowercase();
        if normalized.is_empty() || HELP_KEYWORDS.contains(&normalized.as_str()) {
            return Command::Help;
        }
        match normalized.as_str() {
            "random" => return Command::Random,
            "daily" | "today" => return Command::Daily,
            "next" => return Command::Next,
            _ => {}
        }
        if let Some(refs) = parse_references(&normalized) {
            return Command::References(refs);
        }
        if moods.is_mood(&normalized) {
            return Command::Mood(normalized);
        }
        Command::Ask(input.trim().to_string())
    }
}

/// Verse of the day: chapter = (day mod N) + 1, verse = ((day × 2) mod verse count) + 1.
pub fn daily_reference(
    dataset: &Dataset,
    chapter_count: u32,
    day: u32,
) -> std::result::Result<VerseEntry<'_>, GitabotError> {
    let chapter = ((day % chapter_count.max(1)) + 1).to_string();
    let count = dataset.chapter(&chapter).map(Chapter::len).unwrap_or(0);
    if count == 0 {
        return Err(GitabotError::ChapterNotFound { chapter });
    }
    let verse = ((day as usize * 2) % count) + 1;
    resolve_one(dataset, &chapter, &verse.to_string())
}

/// Picks a chapter uniformly from 1..=chapter_count, then one of its verses.
/// Absent or empty chapters are retried up to `attempts` times.
pub fn random_reference<'a, R: Rng>(
    dataset: &'a Dataset,
    chapter_count: u32,
    attempts: u32,
    rng: &mut R,
) -> Option<VerseEntry<'a>> {
    for attempt in 1..=attempts {
        let chapter = rng.gen_range(1..=chapter_count.max(1)).to_string();
        let picked = dataset
            .chapter(&chapter)
            .and_then(|c| c.verse_keys().choose(rng))
            .and_then(|verse| dataset.entry(&chapter, verse));
        match picked {
            Some(entry) => return Some(entry),
            None => debug!("Random attempt {}: chapter {} has no verses", attempt, chapter),
        }
    }
    None
}

enum NextOutcome<'a> {
    NoState,
    Found(VerseEntry<'a>),
    EndOfChapter(String),
}

/// The chat brain shared by the webhook and the `ask` command.
pub struct ChatRouter {
    dataset: Arc<Dataset>,
    formatter: VerseFormatter,
    retriever: Retriever,
    state: Arc<UserStateStore>,
    settings: BotConfig,
    rng: Mutex<StdRng>,
}

impl ChatRouter {
    pub fn new(
        dataset: Arc<Dataset>,
        formatter: VerseFormatter,
        retriever: Retriever,
        state: Arc<UserStateStore>,
        settings: BotConfig,
    ) -> Self {
        Self {
            dataset,
            formatter,
            retriever,
            state,
            settings,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Makes random choices reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn state(&self) -> &UserStateStore {
        &self.state
    }

    /// Produces the reply for `text` from `user`. Never fails: internal errors
    /// become a generic apology.
    pub async fn respond(&self, user: &str, text: &str) -> String {
        let day = chrono::Local::now().day();
        match self.route(user, text, day).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Failed to handle message from {}: {:#}", user, e);
                ERROR_REPLY.to_string()
            }
        }
    }

    async fn route(&self, user: &str, text: &str, day: u32) -> Result<String> {
        let command = Command::parse(text, self.retriever.moods());
        info!("Message from {} routed as {:?}", user, command);
        match command {
            Command::Help => Ok(self.help_text()),
            Command::Random => self.random_verse(user).await,
            Command::Daily => self.daily_verse(user, day).await,
            Command::Next => self.next_verse(user).await,
            Command::References(refs) => self.referenced_verses(user, &refs).await,
            Command::Mood(input) | Command::Ask(input) => self.retrieve(&input).await,
        }
    }

    async fn random_verse(&self, user: &str) -> Result<String> {
        let picked = {
            let mut rng = self.request_rng();
            random_reference(
                &self.dataset,
                self.settings.chapter_count,
                self.settings.random_attempts,
                &mut rng,
            )
        };
        match picked {
            Some(entry) => {
                self.remember(user, &entry).await;
                self.formatter.format(&entry)
            }
            None => {
                warn!(
                    "No random verse found after {} attempts",
                    self.settings.random_attempts
                );
                Ok(RANDOM_FAILED.to_string())
            }
        }
    }

    async fn daily_verse(&self, user: &str, day: u32) -> Result<String> {
        match daily_reference(&self.dataset, self.settings.chapter_count, day) {
            Ok(entry) => {
                self.remember(user, &entry).await;
                self.formatter.format(&entry)
            }
            Err(e) => Ok(not_found_reply(&e)),
        }
    }

    async fn next_verse(&self, user: &str) -> Result<String> {
        let dataset: &Dataset = &self.dataset;
        let outcome = self
            .state
            .update(user, |current| match current {
                None => (None, NextOutcome::NoState),
                Some(position) => {
                    let next = position
                        .verse
                        .trim()
                        .parse::<u64>()
                        .ok()
                        .and_then(|v| dataset.entry(&position.chapter, &(v + 1).to_string()));
                    match next {
                        Some(entry) => (
                            Some(VersePosition::new(entry.chapter, entry.verse)),
                            NextOutcome::Found(entry),
                        ),
                        None => (None, NextOutcome::EndOfChapter(position.chapter.clone())),
                    }
                }
            })
            .await?;
        match outcome {
            NextOutcome::NoState => Ok(START_PROMPT.to_string()),
            NextOutcome::Found(entry) => self.formatter.format(&entry),
            NextOutcome::EndOfChapter(chapter) => {
                Ok(format!("You've reached the end of chapter {}.", chapter))
            }
        }
    }

    async fn referenced_verses(&self, user: &str, refs: &[VerseRef]) -> Result<String> {
        let cap = self.settings.max_references;
        if refs.len() > cap {
            debug!("Dropping {} reference(s) beyond the cap of {}", refs.len() - cap, cap);
        }
        let mut blocks = Vec::new();
        let mut last_found = None;
        for reference in refs.iter().take(cap) {
            match resolve_one(&self.dataset, &reference.chapter, &reference.verse) {
                Ok(entry) => {
                    blocks.push(self.formatter.format(&entry)?);
                    last_found = Some(entry);
                }
                Err(e) => blocks.push(not_found_reply(&e)),
            }
        }
        if let Some(entry) = last_found {
            self.remember(user, &entry).await;
        }
        Ok(blocks.join(VERSE_SEPARATOR))
    }

    async fn retrieve(&self, input: &str) -> Result<String> {
        let mut rng = self.request_rng();
        match self.retriever.retrieve(&self.dataset, input, &mut rng).await? {
            Retrieval::Mood(verses) | Retrieval::Semantic(verses) => {
                self.formatter.format_all(&verses)
            }
            Retrieval::Nothing => Ok(self.no_match_text()),
        }
    }

    async fn remember(&self, user: &str, entry: &VerseEntry<'_>) {
        let position = VersePosition::new(entry.chapter, entry.verse);
        if let Err(e) = self.state.record(user, position).await {
            warn!("Could not save position for {}: {:#}", user, e);
        }
    }

    /// A per-request generator seeded from the router's generator, so no lock
    /// is held across awaits.
    fn request_rng(&self) -> StdRng {
        let mut master = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        StdRng::seed_from_u64(master.gen())
    }

    fn mood_list(&self) -> String {
        self.retriever.moods().labels().collect::<Vec<_>>().join(", ")
    }

    fn help_text(&self) -> String {
        let mut text = format!(
            "🙏 *Welcome to the Bhagavad Gita bot!*\n\n\
             • Send a verse like *2.47* (or *2.47,48 3.5*) to read it\n\
             • *random* for a random verse\n\
             • *daily* for the verse of the day\n\
             • *next* to continue after the last verse you read\n\
             • Tell me how you feel: {}",
            self.mood_list()
        );
        if self.retriever.has_semantic() {
            text.push_str("\n• Or ask anything in your own words");
        }
        text
    }

    fn no_match_text(&self) -> String {
        format!(
            "I couldn't find verses for that. Try a verse like 2.47, or one of these moods: {}",
            self.mood_list()
        )
    }
}

fn not_found_reply(err: &GitabotError) -> String {
    format!("{}.", err)
}
