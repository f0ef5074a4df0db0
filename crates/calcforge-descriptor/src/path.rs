//! Protected field paths
//!
//! Provides [`FieldPath`], a closed set of path templates addressing leaves of
//! a descriptor that may carry user-visible payloads (usually images).
//!
//! # Examples
//! - `theme.backgroundImage`
//! - `appBackground.backgroundImageUrl`
//! - `button.btn_1.backgroundImage`

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Button keys that a protected path may never address
///
/// These are owned by the sanitizer; pinning them would fight grid repair.
pub const STRUCTURAL_BUTTON_FIELDS: [&str; 5] = ["id", "label", "action", "gridPosition", "type"];

/// Address of a single descriptor leaf
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldPath {
    /// `theme.<field>`
    Theme { field: String },

    /// `appBackground.<field>`
    AppBackground { field: String },

    /// `button.<id>.<field>`
    Button { id: String, field: String },
}

impl FieldPath {
    /// Path to a theme property
    #[inline]
    #[must_use]
    pub fn theme(field: impl Into<String>) -> Self {
        Self::Theme {
            field: field.into(),
        }
    }

    /// Path to an app background property
    #[inline]
    #[must_use]
    pub fn app_background(field: impl Into<String>) -> Self {
        Self::AppBackground {
            field: field.into(),
        }
    }

    /// Path to a visual property of one button
    #[inline]
    #[must_use]
    pub fn button(id: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Button {
            id: id.into(),
            field: field.into(),
        }
    }

    /// Leaf key addressed by this path
    #[inline]
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Theme { field } | Self::AppBackground { field } | Self::Button { field, .. } => {
                field
            }
        }
    }

    /// Button id, for button paths
    #[inline]
    #[must_use]
    pub fn button_id(&self) -> Option<&str> {
        match self {
            Self::Button { id, .. } => Some(id),
            _ => None,
        }
    }

    fn validate_field(field: &str) -> Result<(), PathError> {
        if field.is_empty() {
            return Err(PathError::EmptySegment);
        }
        if field.contains(|c: char| !c.is_alphanumeric() && c != '_') {
            return Err(PathError::InvalidSegment(field.to_string()));
        }
        Ok(())
    }

    fn validate_id(id: &str) -> Result<(), PathError> {
        if id.is_empty() {
            return Err(PathError::EmptySegment);
        }
        if id.contains(|c: char| !c.is_alphanumeric() && c != '_' && c != '-') {
            return Err(PathError::InvalidSegment(id.to_string()));
        }
        Ok(())
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Theme { field } => write!(f, "theme.{field}"),
            Self::AppBackground { field } => write!(f, "appBackground.{field}"),
            Self::Button { id, field } => write!(f, "button.{id}.{field}"),
        }
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(PathError::Empty);
        }

        let segments: Vec<&str> = s.trim().split('.').collect();
        match segments.as_slice() {
            ["theme", field] => {
                Self::validate_field(field)?;
                Ok(Self::theme(*field))
            }
            ["appBackground", field] => {
                Self::validate_field(field)?;
                Ok(Self::app_background(*field))
            }
            ["button", id, field] => {
                Self::validate_id(id)?;
                Self::validate_field(field)?;
                if STRUCTURAL_BUTTON_FIELDS.contains(field) {
                    return Err(PathError::StructuralField((*field).to_string()));
                }
                Ok(Self::button(*id, *field))
            }
            ["theme" | "appBackground", ..] => Err(PathError::WrongArity {
                path: s.to_string(),
                expected: 2,
            }),
            ["button", ..] => Err(PathError::WrongArity {
                path: s.to_string(),
                expected: 3,
            }),
            [root, ..] => Err(PathError::UnknownRoot((*root).to_string())),
            [] => Err(PathError::Empty),
        }
    }
}

impl serde::Serialize for FieldPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for FieldPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to field paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Blank path
    #[error("path is empty")]
    Empty,

    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Invalid segment characters
    #[error("invalid segment: {0} (must be alphanumeric or underscore)")]
    InvalidSegment(String),

    /// First segment is not a known root
    #[error("unknown path root '{0}' (expected theme, appBackground or button)")]
    UnknownRoot(String),

    /// Wrong number of segments for the root
    #[error("path '{path}' must have exactly {expected} segments")]
    WrongArity { path: String, expected: usize },

    /// Button path targets a key the sanitizer owns
    #[error("button field '{0}' cannot be protected")]
    StructuralField(String),
}
