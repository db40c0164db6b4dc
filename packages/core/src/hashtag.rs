//! Hashtag extraction.
//!
//! A hashtag is a `#` followed by one or more characters that are neither
//! whitespace nor another `#`. Titles are stored without the `#`, lowercased.

use std::sync::LazyLock;

use regex::Regex;

/// Longest title the hashtag table accepts. Longer tokens are not tags.
pub const MAX_HASHTAG_CHARS: usize = 15;

/// `#[^\s#]+`
static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[^\s#]+").expect("invalid hashtag regex"));

/// Extract the distinct hashtag titles from post content, in order of first
/// appearance.
///
/// Titles are lowercased, so `#Rust` and `#rust` yield a single `"rust"`.
/// Tokens longer than [`MAX_HASHTAG_CHARS`] are skipped.
pub fn extract_hashtags(content: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for m in HASHTAG_RE.find_iter(content) {
        let title = m.as_str()[1..].to_lowercase();
        if title.chars().count() > MAX_HASHTAG_CHARS || tags.contains(&title) {
            continue;
        }
        tags.push(title);
    }
    tags
}

/// Normalise a search query to the stored title form.
///
/// Surrounding whitespace and a leading `#` are dropped and the rest is
/// lowercased. Returns `None` when nothing is left to search for.
pub fn normalize_hashtag(query: &str) -> Option<String> {
    let trimmed = query.trim();
    let title = trimmed.strip_prefix('#').unwrap_or(trimmed).to_lowercase();
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}
