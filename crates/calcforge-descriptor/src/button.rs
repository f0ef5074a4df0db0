//! Calculator buttons and their grid placement

use crate::action::{Action, ActionKind};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Visual category used when a button omits `type`
pub const DEFAULT_BUTTON_KIND: &str = "primary";

/// Cell a button occupies in the layout grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct GridPosition {
    pub row: u32,
    pub column: u32,
    #[serde(rename = "columnSpan", default, skip_serializing_if = "Option::is_none")]
    pub column_span: Option<u32>,
}

impl GridPosition {
    /// Single-cell position
    #[inline]
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self {
            row,
            column,
            column_span: None,
        }
    }
}

impl Default for GridPosition {
    /// First keypad row, leftmost column
    fn default() -> Self {
        Self::new(1, 0)
    }
}

fn default_button_kind() -> String {
    DEFAULT_BUTTON_KIND.to_string()
}

/// One button of the calculator keypad
///
/// `id` is the stable merge key. Everything not modelled explicitly
/// (`customColor`, `isWide`, `fontSize`, `backgroundImage`, ...) lives in
/// [`Button::props`] and is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Button {
    pub id: String,
    pub label: String,
    pub action: Action,
    #[serde(rename = "gridPosition")]
    pub grid_position: GridPosition,
    #[serde(rename = "type", default = "default_button_kind")]
    pub kind: String,
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

impl Button {
    /// Create a button with no visual props
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        action: Action,
        grid_position: GridPosition,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            action,
            grid_position,
            kind: default_button_kind(),
            props: Map::new(),
        }
    }

    /// Set the visual category
    #[inline]
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Action discriminator
    #[inline]
    #[must_use]
    pub fn action_kind(&self) -> ActionKind {
        self.action.kind()
    }

    /// Get a visual prop
    #[inline]
    #[must_use]
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }
}

/// Derive a readable label from a button id
///
/// Strips a conventional `btn_`/`button_` prefix: `btn_add` → `add`.
#[must_use]
pub fn label_slug(id: &str) -> String {
    let trimmed = id.trim();
    let stripped = ["btn_", "btn-", "button_", "button-"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);
    if stripped.is_empty() {
        trimmed.to_string()
    } else {
        stripped.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn decodes_with_extra_props() {
        let raw = json!({
            "id": "btn_1",
            "label": "1",
            "action": {"type": "input", "value": "1"},
            "gridPosition": {"row": 3, "column": 0},
            "type": "primary",
            "backgroundImage": "data:image/png;base64,AAA",
            "fontSize": 30
        });
        let button: Button = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(button.prop("fontSize"), Some(&json!(30)));
        assert_eq!(button.grid_position, GridPosition::new(3, 0));
        assert_eq!(serde_json::to_value(&button).unwrap(), raw);
    }

    #[test]
    fn type_defaults_to_primary() {
        let button: Button = serde_json::from_value(json!({
            "id": "b",
            "label": "b",
            "action": {"type": "equals"},
            "gridPosition": {"row": 1, "column": 1}
        }))
        .unwrap();
        assert_eq!(button.kind, DEFAULT_BUTTON_KIND);
    }

    #[test]
    fn negative_grid_position_fails() {
        let result: Result<GridPosition, _> = serde_json::from_value(json!({"row": -1, "column": 0}));
        assert!(result.is_err());
    }

    #[test]
    fn slug_strips_prefix() {
        assert_eq!(label_slug("btn_add"), "add");
        assert_eq!(label_slug("button-sin"), "sin");
        assert_eq!(label_slug("equals"), "equals");
        assert_eq!(label_slug("btn_"), "btn_");
    }
}
