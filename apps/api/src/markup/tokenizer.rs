//! Tokenizer over `<`…`>` boundaries.
//!
//! Splits text into plain runs, complete tags and unterminated `<` fragments.
//! Every byte of the input belongs to exactly one token, so concatenating
//! `Token::as_str()` over the output reproduces the input.

use super::{
    MAX_PENDING_RECOMMENDATION_BYTES, MAX_PENDING_TAG_BYTES, RECOMMENDATION_TAG, THOUGHT_TAG_NAMES,
};

/// Classification of a complete `<...>` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    ThoughtOpen,
    ThoughtClose,
    RecommendationOpen,
    RecommendationClose,
    RecommendationSelfClosing,
    Other,
}

impl TagKind {
    pub fn is_thought_marker(self) -> bool {
        matches!(self, TagKind::ThoughtOpen | TagKind::ThoughtClose)
    }

    pub fn is_recommendation(self) -> bool {
        matches!(
            self,
            TagKind::RecommendationOpen
                | TagKind::RecommendationClose
                | TagKind::RecommendationSelfClosing
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Plain text containing no `<`.
    Text(&'a str),
    /// A `<` with no `>` before the next `<` or the end of input.
    Fragment(&'a str),
    /// A complete `<...>` with no inner `<`.
    Tag { raw: &'a str, kind: TagKind },
}

impl<'a> Token<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Token::Text(s) | Token::Fragment(s) => s,
            Token::Tag { raw, .. } => raw,
        }
    }
}

pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let Some(lt) = rest.find('<') else {
            tokens.push(Token::Text(rest));
            break;
        };
        if lt > 0 {
            tokens.push(Token::Text(&rest[..lt]));
        }

        let start = pos + lt;
        let after = &input[start + 1..];
        match after.find(['<', '>']) {
            Some(i) if after.as_bytes()[i] == b'>' => {
                let raw = &input[start..start + i + 2];
                tokens.push(Token::Tag {
                    raw,
                    kind: classify_tag(raw),
                });
                pos = start + i + 2;
            }
            Some(i) => {
                tokens.push(Token::Fragment(&input[start..start + i + 1]));
                pos = start + i + 1;
            }
            None => {
                tokens.push(Token::Fragment(&input[start..]));
                pos = input.len();
            }
        }
    }

    tokens
}

/// Classifies a complete tag (`raw` starts with `<` and ends with `>`).
pub fn classify_tag(raw: &str) -> TagKind {
    let inner = raw[1..raw.len() - 1].trim();
    let (closing, rest) = match inner.strip_prefix('/') {
        Some(r) => (true, r.trim_start()),
        None => (false, inner),
    };
    let (self_closing, body) = match rest.strip_suffix('/') {
        Some(b) if !closing => (true, b.trim_end()),
        _ => (false, rest),
    };
    let name = body.split(char::is_whitespace).next().unwrap_or("");

    if THOUGHT_TAG_NAMES
        .iter()
        .any(|t| t.eq_ignore_ascii_case(body))
    {
        return if closing {
            TagKind::ThoughtClose
        } else {
            TagKind::ThoughtOpen
        };
    }

    if name.eq_ignore_ascii_case(RECOMMENDATION_TAG) {
        return if closing {
            TagKind::RecommendationClose
        } else if self_closing {
            TagKind::RecommendationSelfClosing
        } else {
            TagKind::RecommendationOpen
        };
    }

    TagKind::Other
}

/// True when an unterminated fragment is the start of a recommendation tag,
/// or ends while its name could still grow into one (`<job-li`).
pub fn fragment_is_recommendation(fragment: &str) -> bool {
    let Some(rest) = fragment.strip_prefix('<') else {
        return false;
    };
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('/').unwrap_or(rest).trim_start();
    let name: String = rest
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '/')
        .collect();
    if name.is_empty() {
        return false;
    }
    let lower = name.to_ascii_lowercase();
    lower == RECOMMENDATION_TAG
        || (rest.len() == name.len() && RECOMMENDATION_TAG.starts_with(&lower))
}

/// Splits off a trailing unterminated `<...` so it can be re-joined with the
/// next delta. Returns `(ready, pending)`; `pending` is empty when nothing is
/// held back.
pub fn split_unterminated_tail(text: &str) -> (&str, &str) {
    match text.rfind('<') {
        Some(i) if !text[i..].contains('>') && may_hold(&text[i..]) => (&text[..i], &text[i..]),
        _ => (text, ""),
    }
}

fn may_hold(fragment: &str) -> bool {
    fragment.len() <= MAX_PENDING_TAG_BYTES
        || (fragment.len() <= MAX_PENDING_RECOMMENDATION_BYTES
            && fragment_is_recommendation(fragment))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Option<TagKind>> {
        tokenize(input)
            .into_iter()
            .map(|t| match t {
                Token::Tag { kind, .. } => Some(kind),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_tokens_reassemble_input() {
        let input = "a < b <think>x</think> c <job-listing id=\"1\" /> <unterminated";
        let joined: String = tokenize(input).iter().map(|t| t.as_str()).collect();
        assert_eq!(joined, input);
    }

    #[test]
    fn test_thought_marker_variants() {
        assert_eq!(classify_tag("<think>"), TagKind::ThoughtOpen);
        assert_eq!(classify_tag("< THINK >"), TagKind::ThoughtOpen);
        assert_eq!(classify_tag("</ Thinking>"), TagKind::ThoughtClose);
        assert_eq!(classify_tag("</think >"), TagKind::ThoughtClose);
        assert_eq!(classify_tag("<think about=\"x\">"), TagKind::Other);
    }

    #[test]
    fn test_recommendation_variants() {
        assert_eq!(
            classify_tag("<job-listing id=\"1\" />"),
            TagKind::RecommendationSelfClosing
        );
        assert_eq!(
            classify_tag("<JOB-LISTING id='1'/>"),
            TagKind::RecommendationSelfClosing
        );
        assert_eq!(
            classify_tag("<job-listing id=\"1\">"),
            TagKind::RecommendationOpen
        );
        assert_eq!(classify_tag("</job-listing>"), TagKind::RecommendationClose);
        assert_eq!(classify_tag("<job-listings>"), TagKind::Other);
    }

    #[test]
    fn test_fragment_ends_at_next_lt() {
        assert_eq!(
            kinds("1 < 2 <b>"),
            vec![None, None, Some(TagKind::Other)]
        );
        assert_eq!(tokenize("1 < 2 <b>")[1], Token::Fragment("< 2 "));
    }

    #[test]
    fn test_fragment_is_recommendation() {
        assert!(fragment_is_recommendation("<job-li"));
        assert!(fragment_is_recommendation("<job-listing id=\"1\" title="));
        assert!(fragment_is_recommendation("< /Job-Listing"));
        assert!(!fragment_is_recommendation("< 2 "));
        assert!(!fragment_is_recommendation("<jobs"));
        assert!(!fragment_is_recommendation("<"));
        assert!(!fragment_is_recommendation("<j c"));
    }

    #[test]
    fn test_split_unterminated_tail() {
        assert_eq!(split_unterminated_tail("hello <thi"), ("hello ", "<thi"));
        assert_eq!(split_unterminated_tail("hello <b> there"), ("hello <b> there", ""));
        assert_eq!(split_unterminated_tail("plain"), ("plain", ""));

        let long = format!("x <{}", "a".repeat(MAX_PENDING_TAG_BYTES));
        assert_eq!(split_unterminated_tail(&long), (long.as_str(), ""));
    }

    #[test]
    fn test_long_recommendation_fragment_is_held() {
        let fragment = format!(
            "<job-listing id=\"1\" title=\"Engineer\" summary=\"{}",
            "a".repeat(MAX_PENDING_TAG_BYTES)
        );
        let text = format!("Try:\n{fragment}");
        assert_eq!(split_unterminated_tail(&text), ("Try:\n", fragment.as_str()));

        let oversized = format!("x {fragment}{}", "a".repeat(MAX_PENDING_RECOMMENDATION_BYTES));
        assert_eq!(split_unterminated_tail(&oversized), (oversized.as_str(), ""));
    }
}
