//! Relay error types

/// Errors surfaced by the relay to its front ends.
///
/// Store faults never appear here: they are absorbed by the read-through
/// cache (see [`StoreError`](crate::cache::StoreError)).
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    // Upstream errors
    /// Transport failure talking to the forum (DNS, refused, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Forum answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Validation errors
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl RelayError {
    /// Shorthand for a missing required argument.
    pub fn missing(field: &str) -> Self {
        RelayError::InvalidInput(format!("missing required parameter '{field}'"))
    }

    /// Whether the error came from the upstream forum rather than the caller.
    pub fn is_upstream(&self) -> bool {
        matches!(self, RelayError::Http(_) | RelayError::Api { .. })
    }
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;
