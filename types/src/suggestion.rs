//! Ephemeral recommendations surfaced to the editor.
//!
//! Suggestions are rebuilt wholesale on each refresh; nothing here is merged
//! or persisted.

use serde::{Deserialize, Serialize};

use crate::text::title_from_text;

/// Maximum title length in characters, ellipsis included.
pub const TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionCategory {
    Documentation,
    Testing,
    Performance,
    Refactor,
    Security,
    Style,
}

/// Scan order for [`SuggestionCategory::classify`]; first match wins.
const CATEGORY_KEYWORDS: [(SuggestionCategory, &[&str]); 5] = [
    (
        SuggestionCategory::Documentation,
        &["docstring", "document", "comment"],
    ),
    (SuggestionCategory::Testing, &["test"]),
    (
        SuggestionCategory::Performance,
        &["performance", "optimiz", "slow"],
    ),
    (SuggestionCategory::Refactor, &["refactor", "complex", "simplif"]),
    (
        SuggestionCategory::Security,
        &["security", "vulnerab", "unsafe"],
    ),
];

impl SuggestionCategory {
    /// Case-insensitive keyword scan; `Style` when nothing matches.
    #[must_use]
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        CATEGORY_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
            .map_or(Self::Style, |(category, _)| *category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionPriority {
    High,
    Medium,
    Low,
}

const HIGH_PRIORITY_KEYWORDS: &[&str] = &["error", "security", "vulnerability"];
const MEDIUM_PRIORITY_KEYWORDS: &[&str] = &["performance", "complexity", "refactor"];

impl SuggestionPriority {
    #[must_use]
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        let mentions = |keywords: &[&str]| keywords.iter().any(|kw| lower.contains(kw));
        if mentions(HIGH_PRIORITY_KEYWORDS) {
            Self::High
        } else if mentions(MEDIUM_PRIORITY_KEYWORDS) {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: SuggestionCategory,
    pub priority: SuggestionPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl Suggestion {
    /// Build a suggestion from free text; category, priority and title are
    /// all derived from the text itself.
    #[must_use]
    pub fn from_text(id: impl Into<String>, text: &str, file: Option<&str>) -> Self {
        Self {
            id: id.into(),
            title: title_from_text(text, TITLE_MAX_CHARS),
            description: text.trim().to_string(),
            category: SuggestionCategory::classify(text),
            priority: SuggestionPriority::classify(text),
            file: file.map(str::to_string),
            line: None,
            action: None,
        }
    }
}
