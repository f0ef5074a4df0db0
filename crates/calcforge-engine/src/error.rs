//! Error types for the engine
//!
//! Only malformed top-level input is fatal. Everything the pipeline can
//! repair or drop is reported as a [`crate::Diagnostic`] instead.

use calcforge_descriptor::PathError;
use serde_json::Value;

/// Fatal engine errors
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The decoded patch is not a JSON object
    #[error("malformed patch: expected a JSON object, got {found}")]
    MalformedPatch { found: &'static str },

    /// An explicit protected path is not a known template
    #[error("invalid protected path: {0}")]
    InvalidProtectedPath(#[from] PathError),

    /// Descriptor could not be converted to or from JSON
    #[error("descriptor serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Build a malformed-patch error describing the offending value
    #[must_use]
    pub fn malformed_patch(value: &Value) -> Self {
        Self::MalformedPatch {
            found: json_kind(value),
        }
    }

    /// Whether re-prompting the model could fix this error
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::MalformedPatch { .. })
    }
}

/// Human-readable JSON type name
#[must_use]
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_patch_display() {
        let err = EngineError::malformed_patch(&json!([1, 2]));
        assert_eq!(err.to_string(), "malformed patch: expected a JSON object, got array");
        assert!(err.is_retryable());
    }

    #[test]
    fn path_error_conversion() {
        let err: EngineError = PathError::Empty.into();
        assert!(matches!(err, EngineError::InvalidProtectedPath(_)));
        assert!(!err.is_retryable());
    }
}
