use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Value a client may send to mean "no constraint on this dimension".
pub const ANY_FILTER: &str = "Any";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry of a conversation. Order within a conversation is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The location/department selection active for the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub departments: Vec<String>,
}

impl FilterState {
    /// Active location constraints, sorted and de-duplicated.
    /// `None` when the dimension is unconstrained.
    pub fn active_locations(&self) -> Option<BTreeSet<&str>> {
        active_values(&self.locations)
    }

    /// Active department constraints, sorted and de-duplicated.
    /// `None` when the dimension is unconstrained.
    pub fn active_departments(&self) -> Option<BTreeSet<&str>> {
        active_values(&self.departments)
    }

    pub fn is_unconstrained(&self) -> bool {
        self.active_locations().is_none() && self.active_departments().is_none()
    }
}

/// Blank values are ignored; an empty selection or one containing
/// [`ANY_FILTER`] leaves the dimension unconstrained.
fn active_values(values: &[String]) -> Option<BTreeSet<&str>> {
    let set: BTreeSet<&str> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();
    if set.is_empty() || set.iter().any(|v| v.eq_ignore_ascii_case(ANY_FILTER)) {
        None
    } else {
        Some(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_is_lowercase() {
        let msg: Message = serde_json::from_str(r#"{"role":"assistant","content":"hi"}"#).unwrap();
        assert_eq!(msg, Message::assistant("hi"));
        assert_eq!(
            serde_json::to_string(&Message::user("x")).unwrap(),
            r#"{"role":"user","content":"x"}"#
        );
    }

    #[test]
    fn test_filter_state_defaults_when_fields_missing() {
        let filters: FilterState = serde_json::from_str("{}").unwrap();
        assert!(filters.is_unconstrained());
    }

    #[test]
    fn test_any_sentinel_is_unconstrained() {
        let filters = FilterState {
            locations: vec!["any".to_string(), "London".to_string()],
            departments: vec!["Engineering".to_string()],
        };
        assert!(filters.active_locations().is_none());
        assert_eq!(
            filters.active_departments().unwrap().into_iter().collect::<Vec<_>>(),
            vec!["Engineering"]
        );
    }

    #[test]
    fn test_active_values_are_trimmed_sorted_and_deduplicated() {
        let filters = FilterState {
            locations: vec![
                " Palo Alto ".to_string(),
                "London".to_string(),
                "Palo Alto".to_string(),
                "  ".to_string(),
            ],
            departments: vec![],
        };
        assert_eq!(
            filters.active_locations().unwrap().into_iter().collect::<Vec<_>>(),
            vec!["London", "Palo Alto"]
        );
        assert!(filters.active_departments().is_none());
    }
}
