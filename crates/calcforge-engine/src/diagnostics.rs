//! Non-fatal pipeline findings
//!
//! Dropped buttons, repaired fields and stripped protected writes are
//! collected as [`Diagnostic`] values and returned next to the descriptor.

use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Something the pipeline dropped, repaired or inserted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A field could not be reconciled and was removed or reverted
    FieldDropped { path: String, reason: String },

    /// The patch tried to overwrite a protected leaf
    ProtectedWriteStripped { path: String },

    /// A freshly introduced button failed validation
    ButtonDropped {
        id: Option<String>,
        reason: DropReason,
    },

    /// A trusted button had a broken field replaced by a default
    ButtonRepaired { id: String, field: RepairedField },

    /// A companion button was synthesized
    CompanionInserted { id: String, action: String },

    /// A surplus parameter separator lost its separator action
    DuplicateCompanionDemoted { id: String },

    /// A configured keypad label is absent from the result
    MissingBasicButton { label: String },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldDropped { path, reason } => write!(f, "dropped field {path}: {reason}"),
            Self::ProtectedWriteStripped { path } => {
                write!(f, "ignored write to protected path {path}")
            }
            Self::ButtonDropped { id, reason } => match id {
                Some(id) => write!(f, "dropped button '{id}': {reason}"),
                None => write!(f, "dropped button without id: {reason}"),
            },
            Self::ButtonRepaired { id, field } => write!(f, "repaired {field} of button '{id}'"),
            Self::CompanionInserted { id, action } => {
                write!(f, "inserted {action} companion '{id}'")
            }
            Self::DuplicateCompanionDemoted { id } => {
                write!(f, "demoted duplicate separator '{id}'")
            }
            Self::MissingBasicButton { label } => write!(f, "missing basic button '{label}'"),
        }
    }
}

/// Why a new button was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    NotAnObject,
    MissingId,
    DuplicateId,
    EmptyLabel,
    InvalidAction(String),
    InvalidGridPosition,
    OutOfBounds { row: u32, column: u32 },
    DuplicateLabel(String),
    DuplicateSeparator,
}

impl Display for DropReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => f.write_str("not a JSON object"),
            Self::MissingId => f.write_str("missing id"),
            Self::DuplicateId => f.write_str("duplicate id"),
            Self::EmptyLabel => f.write_str("empty label"),
            Self::InvalidAction(reason) => write!(f, "invalid action ({reason})"),
            Self::InvalidGridPosition => f.write_str("malformed gridPosition"),
            Self::OutOfBounds { row, column } => {
                write!(f, "gridPosition ({row}, {column}) out of bounds")
            }
            Self::DuplicateLabel(label) => write!(f, "label '{label}' already used"),
            Self::DuplicateSeparator => f.write_str("parameter separator already present"),
        }
    }
}

/// Button field replaced during repair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RepairedField {
    Label,
    Action,
    GridPosition,
}

impl Display for RepairedField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Label => "label",
            Self::Action => "action",
            Self::GridPosition => "gridPosition",
        })
    }
}

/// Ordered collection of findings for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding
    #[inline]
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    /// Number of findings
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check for no findings
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate findings in order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Consume into a vector
    #[inline]
    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_messages() {
        let d = Diagnostic::ButtonDropped {
            id: Some("btn_x".into()),
            reason: DropReason::OutOfBounds { row: 20, column: 0 },
        };
        assert_eq!(d.to_string(), "dropped button 'btn_x': gridPosition (20, 0) out of bounds");

        let d = Diagnostic::ButtonRepaired {
            id: "btn_1".into(),
            field: RepairedField::GridPosition,
        };
        assert_eq!(d.to_string(), "repaired gridPosition of button 'btn_1'");
    }

    #[test]
    fn serializes_with_kind_tag() {
        let d = Diagnostic::ProtectedWriteStripped {
            path: "appBackground.backgroundImageUrl".into(),
        };
        assert_eq!(
            serde_json::to_value(&d).unwrap(),
            json!({"kind": "protected_write_stripped", "path": "appBackground.backgroundImageUrl"})
        );
    }

    #[test]
    fn collection_basics() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());
        diags.push(Diagnostic::MissingBasicButton { label: "AC".into() });
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.into_vec().len(), 1);
    }
}
