//! Tag Sanitizer: scrubs structural markup out of generation deltas.
//!
//! Both modes work over the markup tokenizer and repeat until the text stops
//! changing, so `sanitize(sanitize(x)) == sanitize(x)` holds for any input.

use std::borrow::Cow;

use crate::markup::tokenizer::{fragment_is_recommendation, tokenize, TagKind, Token};
use crate::markup::{escape_text, RecommendationTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeMode {
    /// Applied to every delta: drops thought markers and "thinking…"
    /// indicators. Recommendation tags survive; malformed ones become
    /// escaped literal text.
    General,
    /// General mode plus removal of every recommendation tag, so none can
    /// land inside a thought block.
    Reasoning,
}

pub fn sanitize(text: &str, mode: SanitizeMode) -> String {
    let mut current = sanitize_pass(text, mode);
    // Each changing pass removes a `<` or shortens the text, so this terminates.
    loop {
        let next = sanitize_pass(&current, mode);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn sanitize_pass(text: &str, mode: SanitizeMode) -> String {
    let tokens = tokenize(text);
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            Token::Text(t) => out.push_str(&strip_thinking_indicators(t)),
            Token::Fragment(f) => {
                if fragment_is_recommendation(f) {
                    if mode == SanitizeMode::General {
                        out.push_str(&escape_text(f));
                    }
                } else {
                    out.push_str(&strip_thinking_indicators(f));
                }
            }
            Token::Tag { kind, .. } if kind.is_thought_marker() => {}
            Token::Tag { raw, kind } if kind.is_recommendation() => match mode {
                SanitizeMode::General => {
                    if kind == TagKind::RecommendationClose || RecommendationTag::parse(raw).is_ok()
                    {
                        out.push_str(raw);
                    } else {
                        out.push_str(&escape_text(raw));
                    }
                }
                SanitizeMode::Reasoning => {
                    // A paired form takes its body with it.
                    if kind == TagKind::RecommendationOpen {
                        if let Some(close) = tokens[i + 1..].iter().position(|t| {
                            matches!(
                                t,
                                Token::Tag {
                                    kind: TagKind::RecommendationClose,
                                    ..
                                }
                            )
                        }) {
                            i += close + 1;
                        }
                    }
                }
            },
            Token::Tag { raw, .. } => out.push_str(raw),
        }
        i += 1;
    }

    out
}

const WORD: &[u8] = b"thinking";

/// Longest trailing partial indicator held back for the next delta.
const MAX_INDICATOR_TAIL_BYTES: usize = 64;

/// Removes "thinking..." / "Thinking …" style indicators, optionally wrapped
/// in `*` or `_` emphasis. The word must start at a word boundary.
fn strip_thinking_indicators(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut i = 0;

    while i + WORD.len() <= bytes.len() {
        let at_boundary = i == 0 || !bytes[i - 1].is_ascii_alphanumeric();
        if !at_boundary || !bytes[i..i + WORD.len()].eq_ignore_ascii_case(WORD) {
            i += 1;
            continue;
        }

        let mut end = i + WORD.len();
        while end < bytes.len() && matches!(bytes[end], b' ' | b'\t') {
            end += 1;
        }
        let rest = &text[end..];
        let ellipsis = if rest.starts_with("...") {
            3 + rest[3..].bytes().take_while(|b| *b == b'.').count()
        } else if rest.starts_with('…') {
            '…'.len_utf8()
        } else {
            i += 1;
            continue;
        };
        end += ellipsis;

        let mut start = i;
        while start > copied && end < bytes.len() && matches!(bytes[start - 1], b'*' | b'_')
            && bytes[end] == bytes[start - 1]
        {
            start -= 1;
            end += 1;
        }

        let buf = out.get_or_insert_with(|| String::with_capacity(text.len()));
        buf.push_str(&text[copied..start]);
        copied = end;
        i = end;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&text[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(text),
    }
}

/// Splits off a trailing partial indicator (`*Think`, `Thinking..`, `*Thinking...`)
/// that the next delta may complete. Returns `(ready, pending)`; `pending` is
/// empty when nothing is held back.
pub fn split_partial_indicator(text: &str) -> (&str, &str) {
    let floor = text.len().saturating_sub(MAX_INDICATOR_TAIL_BYTES);
    let bytes = text.as_bytes();

    for (i, c) in text.char_indices().skip_while(|(i, _)| *i < floor) {
        let starts_candidate = match c {
            '*' | '_' => i == 0 || text[..i].ends_with(char::is_whitespace),
            't' | 'T' => i == 0 || !bytes[i - 1].is_ascii_alphanumeric(),
            _ => false,
        };
        if starts_candidate && is_partial_indicator(&text[i..]) {
            return (&text[..i], &text[i..]);
        }
    }
    (text, "")
}

/// True when `tail` is an indicator that is not yet complete: a prefix of the
/// word, the word without its ellipsis, or an ellipsis still missing its
/// closing emphasis.
fn is_partial_indicator(tail: &str) -> bool {
    let lead = tail.bytes().take_while(|b| matches!(b, b'*' | b'_')).count();
    let rest = &tail[lead..];

    if rest.len() <= WORD.len() {
        return if rest.is_empty() {
            lead > 0
        } else {
            rest.as_bytes().eq_ignore_ascii_case(&WORD[..rest.len()])
        };
    }
    if !rest.as_bytes()[..WORD.len()].eq_ignore_ascii_case(WORD) {
        return false;
    }

    let after = rest[WORD.len()..].trim_start_matches(|c| c == ' ' || c == '\t');
    if after.is_empty() {
        return true;
    }
    let closing = match after.strip_prefix('…') {
        Some(r) => r,
        None => {
            let dots = after.bytes().take_while(|b| *b == b'.').count();
            if dots == 0 {
                return false;
            }
            if dots < 3 {
                return after.len() == dots;
            }
            &after[dots..]
        }
    };

    if lead == 0 {
        return closing.is_empty();
    }
    let mark = tail.as_bytes()[0];
    closing.len() < lead && closing.bytes().all(|b| b == mark)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG: &str = r#"<job-listing id="12" title="Engineer" department="Eng" locations="Remote" summary="Ship it." />"#;

    #[test]
    fn test_plain_text_passes_through() {
        for mode in [SanitizeMode::General, SanitizeMode::Reasoning] {
            assert_eq!(sanitize("Hello world", mode), "Hello world");
            assert_eq!(sanitize("1 < 2 and 3 > 2", mode), "1 < 2 and 3 > 2");
        }
    }

    #[test]
    fn test_marker_variants_are_removed() {
        assert_eq!(
            sanitize("a<think>b</think>c< THINKING >d</ Think >e", SanitizeMode::General),
            "abcde"
        );
    }

    #[test]
    fn test_spliced_markers_are_removed() {
        assert_eq!(sanitize("<th<think>ink>x", SanitizeMode::General), "x");
    }

    #[test]
    fn test_thinking_indicators_are_removed() {
        assert_eq!(sanitize("Thinking...Answer", SanitizeMode::General), "Answer");
        assert_eq!(sanitize("*thinking …*\nok", SanitizeMode::General), "\nok");
        assert_eq!(sanitize("_THINKING....._ done", SanitizeMode::General), " done");
        assert_eq!(
            sanitize("I was thinking about it", SanitizeMode::General),
            "I was thinking about it"
        );
        assert_eq!(
            sanitize("overthinking...", SanitizeMode::General),
            "overthinking..."
        );
    }

    #[test]
    fn test_split_partial_indicator() {
        assert_eq!(split_partial_indicator("Sure. *Think"), ("Sure. ", "*Think"));
        assert_eq!(split_partial_indicator("*Thinking"), ("", "*Thinking"));
        assert_eq!(split_partial_indicator("x _thinking .."), ("x ", "_thinking .."));
        assert_eq!(split_partial_indicator("**Thinking...*"), ("", "**Thinking...*"));
        assert_eq!(split_partial_indicator("ok *"), ("ok ", "*"));
        assert_eq!(split_partial_indicator("Thinking..."), ("", "Thinking..."));

        // Complete or impossible indicators are left for the sanitizer.
        assert_eq!(split_partial_indicator("*Thinking...*"), ("*Thinking...*", ""));
        assert_eq!(split_partial_indicator("thinking about"), ("thinking about", ""));
        assert_eq!(split_partial_indicator("the end"), ("the end", ""));
        assert_eq!(split_partial_indicator("overthink"), ("overthink", ""));
        assert_eq!(split_partial_indicator("bold**"), ("bold**", ""));
    }

    #[test]
    fn test_general_mode_keeps_valid_recommendations() {
        let text = format!("Try this:\n{TAG}");
        assert_eq!(sanitize(&text, SanitizeMode::General), text);
    }

    #[test]
    fn test_general_mode_escapes_malformed_recommendations() {
        let out = sanitize(
            r#"See <job-listing title="Engineer" /> here"#,
            SanitizeMode::General,
        );
        assert_eq!(out, r#"See &lt;job-listing title="Engineer" /&gt; here"#);
    }

    #[test]
    fn test_reasoning_mode_strips_recommendations() {
        let text = format!(
            "consider {TAG} and <JOB-LISTING id='3' title='x'>body</job-listing> end <job-listing title=\"bad\"/>"
        );
        assert_eq!(
            sanitize(&text, SanitizeMode::Reasoning),
            "consider  and  end "
        );
    }

    #[test]
    fn test_reasoning_mode_drops_unterminated_recommendation() {
        assert_eq!(
            sanitize("weighing <job-listing id=\"1\" title=", SanitizeMode::Reasoning),
            "weighing "
        );
        assert_eq!(
            sanitize("weighing <job-listing id=\"1\" title=", SanitizeMode::General),
            "weighing &lt;job-listing id=\"1\" title="
        );
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            "plain",
            "<think>x</think>",
            "<th<think>ink>nested</th</think>ink>",
            "thin*thinking...*king... left",
            "<job-listing title=\"no id\"/>",
            "<job-listing id=\"1\" title=\"ok\"/><think>",
            "a < b <job-li",
            TAG,
        ];
        for sample in samples {
            for mode in [SanitizeMode::General, SanitizeMode::Reasoning] {
                let once = sanitize(sample, mode);
                assert_eq!(sanitize(&once, mode), once, "input: {sample:?}");
            }
        }
    }

    #[test]
    fn test_sanitize_is_idempotent_on_every_substring() {
        let samples = [
            "x <th<think>ink>y *Thinking...* z",
            "a <job-listing id=\"1\" title=\"t\" /> b </job-listing>",
            "_thinking …_ <JOB-LISTING title='x'>in</job-listing>",
        ];
        for sample in samples {
            let cuts: Vec<usize> = sample
                .char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(sample.len()))
                .collect();
            for &start in &cuts {
                for &end in cuts.iter().filter(|&&end| end >= start) {
                    let piece = &sample[start..end];
                    for mode in [SanitizeMode::General, SanitizeMode::Reasoning] {
                        let once = sanitize(piece, mode);
                        assert_eq!(sanitize(&once, mode), once, "input: {piece:?} {mode:?}");
                        if mode == SanitizeMode::Reasoning {
                            assert!(!once.to_ascii_lowercase().contains("<job-listing"));
                        }
                    }
                }
            }
        }
    }
}
