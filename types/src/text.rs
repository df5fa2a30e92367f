//! Small pure text helpers.

/// Marker appended to truncated text.
pub const ELLIPSIS: &str = "...";

/// Truncate a string to fit within `max_total` characters, appending `suffix` if truncated.
///
/// The suffix counts toward the budget: the returned string is at most `max_total` characters.
/// Counts `char`s, not bytes, so Unicode scalar values are never split.
#[must_use]
pub fn truncate_to_fit(raw: &str, max_total: usize, suffix: &str) -> String {
    if raw.chars().count() <= max_total {
        return raw.to_string();
    }
    let take = max_total.saturating_sub(suffix.chars().count());
    let head: String = raw.chars().take(take).collect();
    format!("{head}{suffix}")
}

/// Text up to (not including) the first sentence-terminating period.
///
/// A period terminates a sentence when followed by whitespace or the end of
/// the text, so `v1.2` and `os.path` stay intact.
#[must_use]
pub fn first_sentence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let mut chars = trimmed.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if ch == '.' && chars.peek().is_none_or(|(_, next)| next.is_whitespace()) {
            return trimmed[..idx].trim_end();
        }
    }
    trimmed
}

/// Short title for free text: its first sentence, at most `max` characters
/// including the [`ELLIPSIS`] marker.
#[must_use]
pub fn title_from_text(raw: &str, max: usize) -> String {
    truncate_to_fit(first_sentence(raw), max.max(ELLIPSIS.len()), ELLIPSIS)
}
