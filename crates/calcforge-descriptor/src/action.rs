//! Button actions
//!
//! Provides [`Action`], the tagged union describing what a button does when
//! pressed. The `type` key is the discriminator; unknown types fail to decode.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// What a calculator button does
///
/// Serialized with an internal `type` tag using camelCase names, e.g.
/// `{"type": "operator", "value": "+"}` or `{"type": "clearAll"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    /// Digit or literal input
    Input { value: String },

    /// Binary operator (`+`, `-`, `*`, `/`, ...)
    Operator { value: String },

    /// Evaluate the pending expression
    Equals,

    /// Clear the current entry
    Clear,

    /// Clear everything
    ClearAll,

    /// Delete the last character
    Backspace,

    /// Decimal point
    Decimal,

    /// Flip sign
    Negate,

    /// Unary expression applied to the display value (`x*x`, `sqrt(x)`)
    Expression { expression: String },

    /// Function taking several parameters (`pow`, `log`, ...)
    ///
    /// Requires a [`Action::ParameterSeparator`] and a
    /// [`Action::FunctionExecute`] button somewhere in the grid.
    MultiParamFunction {
        #[serde(alias = "value")]
        name: String,
    },

    /// Separates parameters of a multi-parameter function
    ParameterSeparator,

    /// Executes a pending multi-parameter function
    FunctionExecute,

    /// User-defined function with named parameters
    CustomFunction {
        name: String,
        parameters: Vec<String>,
    },
}

impl Action {
    /// Harmless fallback used when a trusted button lost its action
    #[inline]
    #[must_use]
    pub fn noop() -> Self {
        Self::Input {
            value: String::new(),
        }
    }

    /// Payload-free discriminator
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Input { .. } => ActionKind::Input,
            Self::Operator { .. } => ActionKind::Operator,
            Self::Equals => ActionKind::Equals,
            Self::Clear => ActionKind::Clear,
            Self::ClearAll => ActionKind::ClearAll,
            Self::Backspace => ActionKind::Backspace,
            Self::Decimal => ActionKind::Decimal,
            Self::Negate => ActionKind::Negate,
            Self::Expression { .. } => ActionKind::Expression,
            Self::MultiParamFunction { .. } => ActionKind::MultiParamFunction,
            Self::ParameterSeparator => ActionKind::ParameterSeparator,
            Self::FunctionExecute => ActionKind::FunctionExecute,
            Self::CustomFunction { .. } => ActionKind::CustomFunction,
        }
    }

    /// Check that the variant's required payload is usable
    ///
    /// Decoding already guarantees presence; this rejects blank strings.
    ///
    /// # Errors
    /// Returns [`ActionError::EmptyPayload`] naming the blank field
    pub fn validate_payload(&self) -> Result<(), ActionError> {
        let blank = |field: &'static str, s: &str| {
            if s.trim().is_empty() {
                Err(ActionError::EmptyPayload {
                    kind: self.kind(),
                    field,
                })
            } else {
                Ok(())
            }
        };

        match self {
            Self::Input { value } | Self::Operator { value } => blank("value", value),
            Self::Expression { expression } => blank("expression", expression),
            Self::MultiParamFunction { name } => blank("name", name),
            Self::CustomFunction { name, .. } => blank("name", name),
            Self::Equals
            | Self::Clear
            | Self::ClearAll
            | Self::Backspace
            | Self::Decimal
            | Self::Negate
            | Self::ParameterSeparator
            | Self::FunctionExecute => Ok(()),
        }
    }
}

/// Action discriminator without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Input,
    Operator,
    Equals,
    Clear,
    ClearAll,
    Backspace,
    Decimal,
    Negate,
    Expression,
    MultiParamFunction,
    ParameterSeparator,
    FunctionExecute,
    CustomFunction,
}

impl ActionKind {
    /// Wire name used in the `type` tag
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Operator => "operator",
            Self::Equals => "equals",
            Self::Clear => "clear",
            Self::ClearAll => "clearAll",
            Self::Backspace => "backspace",
            Self::Decimal => "decimal",
            Self::Negate => "negate",
            Self::Expression => "expression",
            Self::MultiParamFunction => "multiParamFunction",
            Self::ParameterSeparator => "parameterSeparator",
            Self::FunctionExecute => "functionExecute",
            Self::CustomFunction => "customFunction",
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors related to action payloads
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// Required string payload is blank
    #[error("{kind} action has empty '{field}'")]
    EmptyPayload {
        kind: ActionKind,
        field: &'static str,
    },
}
