//! `<job-listing ... />` recommendation tags: parsing and canonical rendering.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{escape_attr, unescape_attr, RECOMMENDATION_TAG};

/// Summaries longer than this many lines are cut when parsed.
const MAX_SUMMARY_LINES: usize = 2;

/// Separator between entries of the `locations` attribute.
pub const LOCATION_SEPARATOR: &str = "|";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("not a job-listing tag")]
    NotRecommendation,

    #[error("malformed attribute syntax at byte {0}")]
    Malformed(usize),

    #[error("missing required attribute '{0}'")]
    MissingAttribute(&'static str),
}

/// One recommended role, as rendered by the client into a job card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationTag {
    pub id: String,
    pub title: String,
    pub department: String,
    pub pay_range: Option<String>,
    pub locations: Vec<String>,
    pub summary: String,
}

impl RecommendationTag {
    /// Parses a complete tag such as
    /// `<job-listing id="42" title="Engineer" locations="Palo Alto|Remote" />`.
    ///
    /// Attribute names are matched case-insensitively and unknown attributes
    /// are ignored. The first occurrence of a repeated attribute wins.
    pub fn parse(raw: &str) -> Result<Self, ParseFailure> {
        let inner = raw
            .trim()
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .ok_or(ParseFailure::NotRecommendation)?
            .trim();
        let body = inner.strip_suffix('/').unwrap_or(inner).trim_end();

        let name_end = body.find(char::is_whitespace).unwrap_or(body.len());
        if !body[..name_end].eq_ignore_ascii_case(RECOMMENDATION_TAG) {
            return Err(ParseFailure::NotRecommendation);
        }

        let attrs = parse_attributes(&body[name_end..])?;
        let get = |key: &str| {
            attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let id = get("id").ok_or(ParseFailure::MissingAttribute("id"))?;
        let title = get("title").ok_or(ParseFailure::MissingAttribute("title"))?;
        let locations = get("locations")
            .map(|v| {
                v.split(LOCATION_SEPARATOR)
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let summary = get("summary")
            .map(|s| {
                s.lines()
                    .take(MAX_SUMMARY_LINES)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();

        Ok(Self {
            id,
            title,
            department: get("department").unwrap_or_default(),
            pay_range: get("payrange"),
            locations,
            summary,
        })
    }

    /// Renders the canonical single-line, self-closing form.
    pub fn render(&self) -> String {
        let mut out = format!(
            "<{RECOMMENDATION_TAG} id=\"{}\" title=\"{}\" department=\"{}\"",
            escape_attr(&self.id),
            escape_attr(&self.title),
            escape_attr(&self.department),
        );
        if let Some(pay) = &self.pay_range {
            out.push_str(&format!(" payrange=\"{}\"", escape_attr(pay)));
        }
        let locations = self
            .locations
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(LOCATION_SEPARATOR);
        out.push_str(&format!(
            " locations=\"{}\" summary=\"{}\" />",
            escape_attr(&locations),
            escape_attr(&self.summary.replace('\n', " ")),
        ));
        out
    }
}

/// Parses `name="value"` / `name='value'` pairs. Names are lowercased.
fn parse_attributes(input: &str) -> Result<Vec<(String, String)>, ParseFailure> {
    let bytes = input.as_bytes();
    let mut attrs = Vec::new();
    let mut i = 0;

    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }

        let name_start = i;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || matches!(bytes[i], b'-' | b'_'))
        {
            i += 1;
        }
        if i == name_start {
            return Err(ParseFailure::Malformed(i));
        }
        let name = input[name_start..i].to_ascii_lowercase();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            return Err(ParseFailure::Malformed(i));
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let quote = match bytes.get(i).copied() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => return Err(ParseFailure::Malformed(i)),
        };
        i += 1;
        let value_start = i;
        let Some(len) = input[value_start..].find(quote as char) else {
            return Err(ParseFailure::Malformed(value_start));
        };
        i = value_start + len + 1;

        let value = unescape_attr(&input[value_start..value_start + len]);
        if !attrs.iter().any(|(k, _)| *k == name) {
            attrs.push((name, value));
        }
    }

    Ok(attrs)
}
