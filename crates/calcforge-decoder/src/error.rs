//! Error types for patch decoding

/// Errors turning model output into a patch object
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Nothing but whitespace
    #[error("model output is empty")]
    Empty,

    /// Input exceeds the configured limit
    #[error("model output is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    /// No `{...}` block could be located
    #[error("no JSON object found in model output")]
    NoJsonObject,

    /// A candidate block was found but does not parse
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Parsed, but the top-level value is not an object
    #[error("expected a JSON object, got {found}")]
    NotAnObject { found: &'static str },
}

impl DecodeError {
    /// Whether asking the model again could help
    ///
    /// Oversize input is a caller limit, not a model mistake.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::TooLarge { .. })
    }
}
