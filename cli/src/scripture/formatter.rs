//! # Verse Message Formatter
//!
//! File: cli/src/scripture/formatter.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Renders a verse record into the chat message shown to users: a header with
//! the chapter/verse reference, the scripture text, the transliteration, then
//! meaning and word meanings for each configured language. Absent fields are
//! simply left out. Rendering has no side effects, so the same record always
//! produces the same text.
//!
//! ## Examples
//!
//! ```text
//! 📖 *Bhagavad Gita 2.47*
//!
//! कर्मण्येवाधिकारस्ते मा फलेषु कदाचन ।
//!
//! _karmaṇy-evādhikāras te mā phaleṣhu kadāchana_
//!
//! 🌼 *Meaning (English):* You have a right to perform your prescribed duties...
//! ```
//!
use super::dataset::{LocalizedText, VerseEntry};
use crate::core::error::Result;
use crate::core::templating::TemplateRenderer;
use serde::Serialize;

/// Separator placed between verses in multi-verse replies.
pub const VERSE_SEPARATOR: &str = "\n\n━━━━━━━━━━━━\n\n";

const VERSE_TEMPLATE_NAME: &str = "verse.txt";

// Blocks end with a blank line; the rendered output is trimmed.
const VERSE_TEMPLATE: &str = "📖 *Bhagavad Gita {{ chapter }}.{{ verse }}*\n\n\
{% if text %}{{ text }}\n\n{% endif %}\
{% if transliteration %}_{{ transliteration }}_\n\n{% endif %}\
{% for m in meanings %}🌼 *Meaning{% if m.label %} ({{ m.label }}){% endif %}:* {{ m.text }}\n\n{% endfor %}\
{% for w in word_meanings %}🔤 *Word meanings{% if w.label %} ({{ w.label }}){% endif %}:* {{ w.text }}\n\n{% endfor %}";

#[derive(Serialize)]
struct LabeledText<'a> {
    label: Option<String>,
    text: &'a str,
}

#[derive(Serialize)]
struct VerseView<'a> {
    chapter: &'a str,
    verse: &'a str,
    text: Option<&'a str>,
    transliteration: Option<&'a str>,
    meanings: Vec<LabeledText<'a>>,
    word_meanings: Vec<LabeledText<'a>>,
}

/// Formats verses for chat replies in a fixed set of languages.
#[derive(Debug, Clone)]
pub struct VerseFormatter {
    renderer: TemplateRenderer,
    languages: Vec<String>,
}

impl VerseFormatter {
    pub fn new(languages: &[String]) -> Result<Self> {
        Ok(Self {
            renderer: TemplateRenderer::from_raw(&[(VERSE_TEMPLATE_NAME, VERSE_TEMPLATE)])?,
            languages: languages
                .iter()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
        })
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn format(&self, entry: &VerseEntry<'_>) -> Result<String> {
        let record = entry.record;
        let view = VerseView {
            chapter: entry.chapter,
            verse: entry.verse,
            text: non_blank(record.text.as_deref()),
            transliteration: non_blank(record.transliteration.as_deref()),
            meanings: self.labeled(record.meaning.as_ref()),
            word_meanings: self.labeled(record.word_meanings.as_ref()),
        };
        let rendered = self.renderer.render(VERSE_TEMPLATE_NAME, &view)?;
        Ok(rendered.trim_end().to_string())
    }

    /// Formats several verses joined by [`VERSE_SEPARATOR`].
    pub fn format_all(&self, entries: &[VerseEntry<'_>]) -> Result<String> {
        let parts = entries
            .iter()
            .map(|e| self.format(e))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(VERSE_SEPARATOR))
    }

    fn labeled<'a>(&self, text: Option<&'a LocalizedText>) -> Vec<LabeledText<'a>> {
        text.map(|t| {
            t.select(&self.languages)
                .into_iter()
                .map(|(label, text)| LabeledText {
                    label: label.map(capitalize),
                    text: text.trim(),
                })
                .collect()
        })
        .unwrap_or_default()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
