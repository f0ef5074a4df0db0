//! The full calculator descriptor
//!
//! A [`Descriptor`] is the JSON document the app persists: theme, button
//! grid and optional whole-screen background. Unknown keys at the top level
//! and inside the layout are preserved in `extra` maps.

use crate::button::Button;
use crate::hash::ContentHash;
use crate::path::FieldPath;
use crate::theme::{AppBackground, Theme, DEFAULT_THEME_NAME};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema version stamped on new descriptors
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Wire names of descriptor keys
#[allow(missing_docs)]
pub mod keys {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const THEME: &str = "theme";
    pub const LAYOUT: &str = "layout";
    pub const APP_BACKGROUND: &str = "appBackground";
    pub const VERSION: &str = "version";
    pub const CREATED_AT: &str = "createdAt";
    pub const AUTHOR_PROMPT: &str = "authorPrompt";
    pub const ROWS: &str = "rows";
    pub const COLUMNS: &str = "columns";
    pub const BUTTONS: &str = "buttons";
    pub const LABEL: &str = "label";
    pub const ACTION: &str = "action";
    pub const GRID_POSITION: &str = "gridPosition";
    pub const TYPE: &str = "type";
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

/// Button grid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Layout {
    /// `1 + max(row)`; recomputed, never trusted from input
    #[serde(default)]
    pub rows: u32,
    /// `1 + max(column)`; recomputed, never trusted from input
    #[serde(default)]
    pub columns: u32,
    #[serde(default)]
    pub buttons: Vec<Button>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Layout {
    /// Largest occupied row, if any button exists
    #[must_use]
    pub fn max_row(&self) -> Option<u32> {
        self.buttons.iter().map(|b| b.grid_position.row).max()
    }

    /// Largest occupied column, if any button exists
    #[must_use]
    pub fn max_column(&self) -> Option<u32> {
        self.buttons.iter().map(|b| b.grid_position.column).max()
    }

    /// Recompute `rows`/`columns` from the buttons
    ///
    /// An empty grid is 0 x 0. Extents saturate at `u32::MAX`.
    pub fn recompute_extent(&mut self) {
        self.rows = self.max_row().map_or(0, |r| r.saturating_add(1));
        self.columns = self.max_column().map_or(0, |c| c.saturating_add(1));
    }

    /// Find a button by id
    #[must_use]
    pub fn button(&self, id: &str) -> Option<&Button> {
        self.buttons.iter().find(|b| b.id == id)
    }

    /// Find a button by id, mutably
    pub fn button_mut(&mut self, id: &str) -> Option<&mut Button> {
        self.buttons.iter_mut().find(|b| b.id == id)
    }

    /// Check whether an id is taken
    #[must_use]
    pub fn contains_id(&self, id: &str) -> bool {
        self.button(id).is_some()
    }
}

/// One calculator's complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Descriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub layout: Layout,
    #[serde(rename = "appBackground", default, skip_serializing_if = "Option::is_none")]
    pub app_background: Option<AppBackground>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: String,
    #[serde(rename = "authorPrompt", default, skip_serializing_if = "Option::is_none")]
    pub author_prompt: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Descriptor {
    /// Empty descriptor with defaults for every required field
    #[must_use]
    pub fn empty(id: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: DEFAULT_THEME_NAME.to_string(),
            description: String::new(),
            theme: Theme::default(),
            layout: Layout::default(),
            app_background: None,
            version: default_version(),
            created_at: created_at.into(),
            author_prompt: None,
            extra: Map::new(),
        }
    }

    /// JSON form
    ///
    /// # Errors
    /// Returns error if a value cannot be represented as JSON
    #[inline]
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Parse from a JSON value
    ///
    /// # Errors
    /// Returns error if the value does not match the schema
    #[inline]
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Canonical content hash
    ///
    /// # Errors
    /// Returns error if the descriptor cannot be represented as JSON
    pub fn fingerprint(&self) -> Result<ContentHash, serde_json::Error> {
        Ok(ContentHash::of_json(&self.to_value()?))
    }

    /// Read the leaf addressed by `path`
    #[must_use]
    pub fn field(&self, path: &FieldPath) -> Option<&Value> {
        match path {
            FieldPath::Theme { field } => self.theme.get(field),
            FieldPath::AppBackground { field } => {
                self.app_background.as_ref().and_then(|bg| bg.get(field))
            }
            FieldPath::Button { id, field } => {
                self.layout.button(id).and_then(|b| b.prop(field))
            }
        }
    }

    /// Write (`Some`) or remove (`None`) the leaf addressed by `path`
    ///
    /// Writing to a missing button is a no-op. Writing to a missing app
    /// background creates it.
    pub fn set_field(&mut self, path: &FieldPath, value: Option<Value>) {
        match (path, value) {
            (FieldPath::Theme { field }, Some(v)) => {
                self.theme.insert(field.clone(), v);
            }
            (FieldPath::Theme { field }, None) => {
                self.theme.remove(field);
            }
            (FieldPath::AppBackground { field }, Some(v)) => {
                self.app_background
                    .get_or_insert_with(AppBackground::default)
                    .insert(field.clone(), v);
            }
            (FieldPath::AppBackground { field }, None) => {
                if let Some(bg) = self.app_background.as_mut() {
                    bg.remove(field);
                }
            }
            (FieldPath::Button { id, field }, value) => {
                if let Some(button) = self.layout.button_mut(id) {
                    match value {
                        Some(v) => {
                            button.props.insert(field.clone(), v);
                        }
                        None => {
                            button.props.remove(field);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::button::GridPosition;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Descriptor {
        Descriptor::from_value(json!({
            "id": "calc_1",
            "name": "Test",
            "theme": {"name": "Dark", "backgroundColor": "#000000"},
            "layout": {
                "name": "grid",
                "rows": 99,
                "columns": 99,
                "buttons": [
                    {"id": "btn_1", "label": "1", "action": {"type": "input", "value": "1"},
                     "gridPosition": {"row": 3, "column": 0}, "backgroundImage": "data:image/png;base64,AAA"},
                    {"id": "btn_add", "label": "+", "action": {"type": "operator", "value": "+"},
                     "gridPosition": {"row": 3, "column": 2}, "type": "operator"}
                ]
            },
            "appBackground": {"backgroundImageUrl": "data:image/png;base64,BBB"},
            "createdAt": "2024-01-01T00:00:00Z",
            "isPreset": false
        }))
        .unwrap()
    }

    #[test]
    fn decodes_with_defaults_and_extras() {
        let d = sample();
        assert_eq!(d.version, DEFAULT_VERSION);
        assert_eq!(d.description, "");
        assert_eq!(d.extra.get("isPreset"), Some(&json!(false)));
        assert_eq!(d.layout.extra.get("name"), Some(&json!("grid")));
    }

    #[test]
    fn recompute_extent_ignores_input_hints() {
        let mut d = sample();
        d.layout.recompute_extent();
        assert_eq!((d.layout.rows, d.layout.columns), (4, 3));
    }

    #[test]
    fn recompute_extent_empty_grid() {
        let mut layout = Layout {
            rows: 5,
            columns: 5,
            ..Layout::default()
        };
        layout.recompute_extent();
        assert_eq!((layout.rows, layout.columns), (0, 0));
    }

    #[test]
    fn recompute_extent_saturates() {
        let mut d = sample();
        d.layout.buttons[0].grid_position = GridPosition::new(u32::MAX, u32::MAX);
        d.layout.recompute_extent();
        assert_eq!((d.layout.rows, d.layout.columns), (u32::MAX, u32::MAX));
    }

    #[test]
    fn field_access_by_path() {
        let d = sample();
        assert_eq!(
            d.field(&FieldPath::button("btn_1", "backgroundImage")),
            Some(&json!("data:image/png;base64,AAA"))
        );
        assert_eq!(
            d.field(&FieldPath::app_background("backgroundImageUrl")),
            Some(&json!("data:image/png;base64,BBB"))
        );
        assert_eq!(d.field(&FieldPath::theme("missing")), None);
        assert_eq!(d.field(&FieldPath::button("nope", "backgroundImage")), None);
    }

    #[test]
    fn set_field_writes_and_removes() {
        let mut d = sample();
        let path = FieldPath::button("btn_add", "fontSize");
        d.set_field(&path, Some(json!(30)));
        assert_eq!(d.field(&path), Some(&json!(30)));
        d.set_field(&path, None);
        assert_eq!(d.field(&path), None);

        let mut bare = Descriptor::empty("x", "now");
        let bg = FieldPath::app_background("backgroundOpacity");
        bare.set_field(&bg, Some(json!(0.5)));
        assert_eq!(bare.field(&bg), Some(&json!(0.5)));
    }

    #[test]
    fn fingerprint_is_stable() {
        let a = sample();
        let b = sample();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());

        let mut c = sample();
        c.layout.buttons.push(Button::new(
            "btn_eq",
            "=",
            Action::Equals,
            GridPosition::new(4, 0),
        ));
        assert_ne!(a.fingerprint().unwrap(), c.fingerprint().unwrap());
    }

    #[test]
    fn empty_descriptor_defaults() {
        let d = Descriptor::empty("ai-generated-1", "2024-01-01T00:00:00Z");
        assert_eq!(d.name, DEFAULT_THEME_NAME);
        assert_eq!(d.theme.name(), Some(DEFAULT_THEME_NAME));
        assert!(d.layout.buttons.is_empty());
        assert_eq!(d.version, DEFAULT_VERSION);
    }
}
