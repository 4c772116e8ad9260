//! Search query text construction.
//!
//! The forum has a single search endpoint; scoping is expressed with
//! modifiers appended to the query text.

use crate::types::SearchType;

/// Query text for an advanced search.
pub fn advanced(query: &str, search_type: &SearchType) -> String {
    match search_type {
        SearchType::Topic => format!("{query} in:title,first"),
        SearchType::Category => format!("{query} #category"),
        SearchType::Other(_) => query.to_string(),
    }
}

/// Query text for a search within one category.
pub fn in_category(query: &str, slug: &str) -> String {
    format!("{query} #{slug}")
}

/// Query text for a tag search. An empty query counts as absent.
pub fn with_tag(tag: &str, query: Option<&str>) -> String {
    match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("{q} tags:{tag}"),
        None => format!("tags:{tag}"),
    }
}
