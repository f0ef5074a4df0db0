//! Patch decoder
//!
//! Language models wrap JSON in code fences, preface it with prose, or trail
//! off with explanations. [`PatchDecoder`] recovers the object anyway.

use crate::error::DecodeError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default input size limit (256 KiB)
pub const DEFAULT_MAX_BYTES: usize = 256 * 1024;

/// First fenced block, with an optional language tag
static FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_-]*\s*(.*?)\s*```").expect("valid fence regex")
});

/// Decoder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Inputs longer than this are rejected before parsing
    pub max_bytes: usize,
    /// Look inside the first code fence
    pub strip_fences: bool,
}

impl DecoderConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With input size limit
    #[inline]
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// With code fence handling toggled
    #[inline]
    #[must_use]
    pub fn with_strip_fences(mut self, strip: bool) -> Self {
        self.strip_fences = strip;
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            strip_fences: true,
        }
    }
}

/// Turns model output into a JSON object
#[derive(Debug, Clone, Default)]
pub struct PatchDecoder {
    config: DecoderConfig,
}

impl PatchDecoder {
    /// Create decoder
    #[inline]
    #[must_use]
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode a reply into a patch object
    ///
    /// Tries the (fence-stripped) text as-is first, then the first balanced
    /// `{...}` block in it.
    ///
    /// # Errors
    /// Returns [`DecodeError`] if the input is empty or too large, holds no
    /// object, holds malformed JSON, or decodes to a non-object
    pub fn decode(&self, raw: &str) -> Result<Map<String, Value>, DecodeError> {
        if raw.len() > self.config.max_bytes {
            return Err(DecodeError::TooLarge {
                size: raw.len(),
                limit: self.config.max_bytes,
            });
        }

        let text = raw.trim();
        if text.is_empty() {
            return Err(DecodeError::Empty);
        }

        let body = if self.config.strip_fences {
            strip_fence(text)
        } else {
            text
        };

        let value = match serde_json::from_str::<Value>(body) {
            Ok(value) => value,
            Err(direct) => match balanced_object(body) {
                Some(candidate) => {
                    tracing::debug!(
                        "Extracted {} byte object from {} byte reply",
                        candidate.len(),
                        body.len()
                    );
                    serde_json::from_str(candidate)?
                }
                None if body.starts_with('{') => return Err(direct.into()),
                None => return Err(DecodeError::NoJsonObject),
            },
        };

        match value {
            Value::Object(map) => Ok(map),
            other => Err(DecodeError::NotAnObject {
                found: kind(&other),
            }),
        }
    }
}

/// Contents of the first code fence, or the text unchanged
fn strip_fence(text: &str) -> &str {
    FENCE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map_or(text, |m| m.as_str())
}

/// First balanced `{...}` block, skipping braces inside strings
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
