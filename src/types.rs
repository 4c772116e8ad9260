//! Request types shared by the upstream client and both front ends.

use std::collections::BTreeMap;
use std::fmt;

/// Filter parameters forwarded verbatim to `GET /posts.json`.
///
/// Ordered so that iteration (and therefore the derived cache key and the
/// upstream query string) is stable.
pub type PostsQuery = BTreeMap<String, String>;

/// Scope of an advanced search.
///
/// Anything other than `topic` or `category` leaves the query text
/// unchanged but is still forwarded, and keyed, under its raw name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchType {
    /// Match in titles and first posts (` in:title,first`).
    #[default]
    Topic,
    /// Restrict to category pages (` #category`).
    Category,
    /// Unrecognised type, no augmentation.
    Other(String),
}

impl SearchType {
    /// Parse a type name as received from a caller.
    pub fn parse(value: &str) -> Self {
        match value {
            "topic" => SearchType::Topic,
            "category" => SearchType::Category,
            other => SearchType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SearchType::Topic => "topic",
            SearchType::Category => "category",
            SearchType::Other(s) => s,
        }
    }
}

impl From<Option<&str>> for SearchType {
    fn from(value: Option<&str>) -> Self {
        value.map(SearchType::parse).unwrap_or_default()
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_types() {
        assert_eq!(SearchType::parse("topic"), SearchType::Topic);
        assert_eq!(SearchType::parse("category"), SearchType::Category);
        assert_eq!(
            SearchType::parse("user"),
            SearchType::Other("user".to_string())
        );
    }

    #[test]
    fn missing_type_defaults_to_topic() {
        assert_eq!(SearchType::from(None), SearchType::Topic);
        assert_eq!(SearchType::from(Some("category")), SearchType::Category);
    }

    #[test]
    fn other_type_keeps_raw_name() {
        assert_eq!(SearchType::parse("Topic").as_str(), "Topic");
    }
}
