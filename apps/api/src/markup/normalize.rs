//! Post-assembly normalization of a finished assistant message.
//!
//! Runs once over the complete text, never over the live stream. The render
//! contract assumes zero or one thought block per message and recommendation
//! tags on their own unindented lines outside any code fence.

use super::recommendation::RecommendationTag;
use super::tokenizer::{tokenize, TagKind, Token};
use super::{THOUGHT_CLOSE, THOUGHT_OPEN};

/// Normalizes a finished message:
/// 1. merges every thought block into one, placed where the first one opened
/// 2. unwraps code fences that hold nothing but recommendation tags
/// 3. puts each recommendation tag on its own unindented line
pub fn normalize_message(text: &str) -> String {
    let split = split_thought(text);
    let before = normalize_answer(&split.outside[..split.insert_at]);

    match split.thought {
        Some(inner) => {
            let after = normalize_answer(&split.outside[split.insert_at..]);
            format!("{before}{THOUGHT_OPEN}{inner}{THOUGHT_CLOSE}{after}")
        }
        None => before,
    }
}

/// Parses the recommendation tags outside the thought block, in order.
/// Tags that fail to parse are skipped.
pub fn extract_recommendations(text: &str) -> Vec<RecommendationTag> {
    let mut in_thought = false;
    let mut tags = Vec::new();
    for token in tokenize(text) {
        match token {
            Token::Tag {
                kind: TagKind::ThoughtOpen,
                ..
            } => in_thought = true,
            Token::Tag {
                kind: TagKind::ThoughtClose,
                ..
            } => in_thought = false,
            Token::Tag {
                raw,
                kind: TagKind::RecommendationSelfClosing | TagKind::RecommendationOpen,
            } if !in_thought => {
                if let Ok(tag) = RecommendationTag::parse(raw) {
                    tags.push(tag);
                }
            }
            _ => {}
        }
    }
    tags
}

struct ThoughtSplit {
    /// Concatenated inner contents of every block, if any block was opened.
    thought: Option<String>,
    /// Everything outside the blocks.
    outside: String,
    /// Offset in `outside` where the first block opened (`outside.len()` if none).
    insert_at: usize,
}

fn split_thought(text: &str) -> ThoughtSplit {
    let mut outside = String::with_capacity(text.len());
    let mut thought: Option<String> = None;
    let mut insert_at = None;
    let mut in_block = false;

    for token in tokenize(text) {
        match token {
            Token::Tag {
                kind: TagKind::ThoughtOpen,
                ..
            } => {
                if thought.is_none() {
                    insert_at = Some(outside.len());
                    thought = Some(String::new());
                }
                in_block = true;
            }
            Token::Tag {
                kind: TagKind::ThoughtClose,
                ..
            } => in_block = false,
            other => match (&mut thought, in_block) {
                (Some(buf), true) => buf.push_str(other.as_str()),
                _ => outside.push_str(other.as_str()),
            },
        }
    }

    ThoughtSplit {
        insert_at: insert_at.unwrap_or(outside.len()),
        thought,
        outside,
    }
}

fn normalize_answer(text: &str) -> String {
    place_tags_on_own_lines(&unwrap_tag_fences(text))
}

/// Removes ``` fences whose body is only recommendation tags and blank lines.
fn unwrap_tag_fences(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        if lines[i].trim_start().starts_with("```") {
            let close = lines[i + 1..]
                .iter()
                .position(|l| l.trim() == "```")
                .map(|p| i + 1 + p);
            if let Some(close) = close {
                let body = &lines[i + 1..close];
                let has_tag = body.iter().any(|l| is_tag_line(l));
                let only_tags = body
                    .iter()
                    .all(|l| l.trim().is_empty() || is_tag_line(l));
                if has_tag && only_tags {
                    out.extend(body.iter().copied().filter(|l| !l.trim().is_empty()));
                    i = close + 1;
                    continue;
                }
            }
        }
        out.push(lines[i]);
        i += 1;
    }

    out.join("\n")
}

fn is_tag_line(line: &str) -> bool {
    let tokens = tokenize(line.trim());
    !tokens.is_empty()
        && tokens.iter().all(|t| match t {
            Token::Tag { kind, .. } => kind.is_recommendation(),
            Token::Text(s) => s.trim().is_empty(),
            Token::Fragment(_) => false,
        })
}

/// Moves recommendation tags out of prose lines and strips their indentation.
fn place_tags_on_own_lines(text: &str) -> String {
    let mut lines = Vec::new();
    for line in text.split('\n') {
        let tokens = tokenize(line);
        if !tokens.iter().any(|t| {
            matches!(
                t,
                Token::Tag {
                    kind: TagKind::RecommendationSelfClosing,
                    ..
                }
            )
        }) {
            lines.push(line.to_string());
            continue;
        }

        let mut prose = String::new();
        let mut tags = Vec::new();
        for token in tokens {
            match token {
                Token::Tag {
                    raw,
                    kind: TagKind::RecommendationSelfClosing,
                } => tags.push(raw.to_string()),
                other => prose.push_str(other.as_str()),
            }
        }
        if !prose.trim().is_empty() {
            lines.push(prose.trim_end().to_string());
        }
        lines.extend(tags);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG: &str = r#"<job-listing id="1" title="Engineer" department="Eng" locations="Palo Alto" summary="Builds things." />"#;

    #[test]
    fn test_single_block_is_unchanged() {
        let text = "<think>plan</think>Here you go.";
        assert_eq!(normalize_message(text), text);
    }

    #[test]
    fn test_fragmented_blocks_are_merged_in_order() {
        let text = "<think>first</think>Partial answer.<think> second</think> Final.";
        assert_eq!(
            normalize_message(text),
            "<think>first second</think>Partial answer. Final."
        );
    }

    #[test]
    fn test_unclosed_block_is_closed() {
        assert_eq!(normalize_message("<think>cut off"), "<think>cut off</think>");
    }

    #[test]
    fn test_message_without_markup_is_unchanged() {
        assert_eq!(normalize_message("Just an answer."), "Just an answer.");
    }

    #[test]
    fn test_fenced_tags_are_unwrapped_and_dedented() {
        let text = format!("Top matches:\n```xml\n    {TAG}\n\n```\nGood luck!");
        assert_eq!(
            normalize_message(&text),
            format!("Top matches:\n{TAG}\nGood luck!")
        );
    }

    #[test]
    fn test_fence_with_code_is_kept() {
        let text = "```rust\nfn main() {}\n```";
        assert_eq!(normalize_message(text), text);
    }

    #[test]
    fn test_inline_tags_move_to_own_lines() {
        let text = format!("Try these: {TAG}{TAG}");
        assert_eq!(
            normalize_message(&text),
            format!("Try these:\n{TAG}\n{TAG}")
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let text = format!("<think>a</think>x\n  {TAG}\n<think>b</think>\n```\n{TAG}\n```");
        let once = normalize_message(&text);
        assert_eq!(normalize_message(&once), once);
    }

    #[test]
    fn test_extract_recommendations_skips_thought_and_malformed() {
        let text = format!(
            "<think>{TAG}</think>Answer\n{TAG}\n<job-listing title=\"No id\" />"
        );
        let tags = extract_recommendations(&text);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].id, "1");
        assert_eq!(tags[0].locations, vec!["Palo Alto"]);
    }
}
