//! Markup protocol shared by the stream pipeline and the render contract.
//!
//! The output stream carries two kinds of structure on top of plain text:
//! - at most one thought block, delimited by [`THOUGHT_OPEN`] / [`THOUGHT_CLOSE`]
//! - self-closing `<job-listing ... />` recommendation tags, answer region only
//!
//! Everything here is pure text processing. No I/O.

pub mod normalize;
pub mod recommendation;
pub mod tokenizer;

pub use normalize::{extract_recommendations, normalize_message};
pub use recommendation::{ParseFailure, RecommendationTag};
pub use tokenizer::{tokenize, TagKind, Token};

/// Opens the collapsible reasoning region.
pub const THOUGHT_OPEN: &str = "<think>";
/// Closes the collapsible reasoning region.
pub const THOUGHT_CLOSE: &str = "</think>";

/// Element name of a recommendation tag.
pub const RECOMMENDATION_TAG: &str = "job-listing";

/// Tag names the backend may echo back as thought markers (matched case-insensitively).
pub const THOUGHT_TAG_NAMES: [&str; 2] = ["think", "thinking"];

/// Longest unterminated `<...` fragment the annotator will hold back waiting for its `>`.
/// Any thought marker or other short tag fits well within this.
pub const MAX_PENDING_TAG_BYTES: usize = 256;

/// Hold-back limit for a fragment that is the start of a recommendation tag.
/// A full tag with a two-line summary and several locations runs past
/// `MAX_PENDING_TAG_BYTES`.
pub const MAX_PENDING_RECOMMENDATION_BYTES: usize = 8 * 1024;

/// Escapes `&`, `<` and `>` so the text can never be read as markup.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes an attribute value for use inside double quotes.
pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// Reverses [`escape_attr`] (plus `&apos;`). Unknown entities are left as-is.
pub fn unescape_attr(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
