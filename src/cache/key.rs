//! Deterministic cache key derivation.
//!
//! Keys have the shape `discourse:<operation>:<k1>:<v1>|<k2>:<v2>` with the
//! parameters sorted by name, so callers may build the parameter list in any
//! order. Existing entries in shared stores were written with this exact
//! format; changing it orphans them.
//!
//! Delimiters inside names or values are not escaped: `q = "a|b:c"` and
//! `q = "a", b = "c"` produce the same key. Kept as-is for compatibility
//! with stored entries.

use std::fmt;

/// Namespace prefix shared by every key the relay writes.
pub const NAMESPACE: &str = "discourse";

/// An opaque, deterministic key into the shared store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    key: String,
    operation: String,
}

impl CacheKey {
    /// The full key string as written to the store.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// The operation this key was derived for; used as a metrics label.
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// Derive the cache key for `operation` called with `params`.
///
/// Parameter order does not matter. An empty parameter list yields
/// `discourse:<operation>:`.
pub fn derive_key<I, K, V>(operation: &str, params: I) -> CacheKey
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: fmt::Display,
{
    let mut pairs: Vec<(String, String)> = params
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.to_string()))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let rendered = pairs
        .iter()
        .map(|(k, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>()
        .join("|");

    CacheKey {
        key: format!("{NAMESPACE}:{operation}:{rendered}"),
        operation: operation.to_string(),
    }
}
