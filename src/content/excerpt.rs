//! Plain-text excerpts for article listings
//!
//! Listings show a one-line summary under each title. Authors may write one in
//! front-matter; otherwise it is derived from the first non-blank line of the
//! body with lightweight markdown noise stripped out.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Shown when a body yields no usable text
pub const EXCERPT_PLACEHOLDER: &str = "本文の概要が準備中です。";

/// Maximum excerpt length in characters, before the ellipsis
pub const EXCERPT_LENGTH: usize = 140;

lazy_static! {
    static ref MARKER_RE: Regex = Regex::new(r"[#>*`]").unwrap();
    static ref LINK_RE: Regex = Regex::new(r"\[([^\]]+)\]\([^)]+\)").unwrap();
    static ref SPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Excerpt derivation knobs, also the `excerpt` section of `_config.yml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcerptOptions {
    /// Maximum length in `char`s
    pub length: usize,
    pub ellipsis: String,
    pub placeholder: String,
}

impl Default for ExcerptOptions {
    fn default() -> Self {
        Self {
            length: EXCERPT_LENGTH,
            ellipsis: "…".to_string(),
            placeholder: EXCERPT_PLACEHOLDER.to_string(),
        }
    }
}

/// Derive an excerpt with the default options
pub fn derive_excerpt(body: Option<&str>, explicit: Option<&str>) -> String {
    derive_excerpt_with(body, explicit, &ExcerptOptions::default())
}

/// Derive an excerpt.
///
/// A non-blank `explicit` excerpt is returned unchanged. Otherwise the first
/// non-blank body line is stripped of markup and truncated to
/// `options.length` characters, counted as Unicode scalar values.
pub fn derive_excerpt_with(
    body: Option<&str>,
    explicit: Option<&str>,
    options: &ExcerptOptions,
) -> String {
    if let Some(explicit) = explicit.filter(|e| !e.trim().is_empty()) {
        return explicit.to_string();
    }

    let candidate = body
        .unwrap_or_default()
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();

    let plain = strip_markup(candidate);
    if plain.is_empty() {
        return options.placeholder.clone();
    }

    truncate_chars(&plain, options.length, &options.ellipsis)
}

/// Strip heading, quote, emphasis and code markers and collapse links
pub fn strip_markup(line: &str) -> String {
    let text = MARKER_RE.replace_all(line, "");
    let text = LINK_RE.replace_all(&text, "$1");
    let text = SPACE_RE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Truncate to `length` chars, appending `omission` only when something was cut
fn truncate_chars(s: &str, length: usize, omission: &str) -> String {
    match s.char_indices().nth(length) {
        Some((cut, _)) => format!("{}{}", &s[..cut], omission),
        None => s.to_string(),
    }
}
