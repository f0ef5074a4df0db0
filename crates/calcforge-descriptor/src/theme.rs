//! Theme and app background property maps
//!
//! Both are open mappings of named visual properties. Only color fields carry
//! a format rule: `#RRGGBB` strings, or arrays of them for gradients.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Theme name used when neither base nor patch supplies one
pub const DEFAULT_THEME_NAME: &str = "Custom";

/// Key holding an explicit color list inside an object-shaped gradient
pub const GRADIENT_COLORS_KEY: &str = "colors";

/// Check for a `#RRGGBB` color string
#[must_use]
pub fn is_hex_color(s: &str) -> bool {
    let Some(digits) = s.strip_prefix('#') else {
        return false;
    };
    digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Whether a key holds an ordered color sequence
#[must_use]
pub fn is_gradient_field(key: &str) -> bool {
    key.ends_with("Gradient") || key == "gradientColors"
}

/// Whether a key holds a single color
#[must_use]
pub fn is_color_field(key: &str) -> bool {
    key.ends_with("Color")
}

/// Check that a value satisfies the color rule for `key`
///
/// Keys that are neither color nor gradient fields always pass.
#[must_use]
pub fn color_value_ok(key: &str, value: &Value) -> bool {
    if is_gradient_field(key) {
        match value {
            Value::Array(items) => items
                .iter()
                .all(|item| item.as_str().is_some_and(is_hex_color)),
            _ => false,
        }
    } else if is_color_field(key) {
        value.as_str().is_some_and(is_hex_color)
    } else {
        true
    }
}

/// Named visual properties of a calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Theme(Map<String, Value>);

impl Theme {
    /// Wrap a property map
    #[inline]
    #[must_use]
    pub fn new(props: Map<String, Value>) -> Self {
        Self(props)
    }

    /// Theme name, if set
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// Get a property
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a property, returning the previous value
    #[inline]
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Remove a property
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Underlying map
    #[inline]
    #[must_use]
    pub fn props(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl Default for Theme {
    fn default() -> Self {
        let mut props = Map::new();
        props.insert("name".into(), Value::String(DEFAULT_THEME_NAME.into()));
        Self(props)
    }
}

/// Whole-screen background overlay (image, gradient, opacities)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AppBackground(Map<String, Value>);

impl AppBackground {
    /// Wrap a property map
    #[inline]
    #[must_use]
    pub fn new(props: Map<String, Value>) -> Self {
        Self(props)
    }

    /// Get a property
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a property, returning the previous value
    #[inline]
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Remove a property
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Underlying map
    #[inline]
    #[must_use]
    pub fn props(&self) -> &Map<String, Value> {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hex_colors() {
        assert!(is_hex_color("#FF9F0A"));
        assert!(is_hex_color("#00ff00"));
        assert!(!is_hex_color("FF9F0A"));
        assert!(!is_hex_color("#FFF"));
        assert!(!is_hex_color("#GG0000"));
        assert!(!is_hex_color("#FF9F0A80"));
    }

    #[test]
    fn field_classification() {
        assert!(is_gradient_field("backgroundGradient"));
        assert!(is_gradient_field("gradientColors"));
        assert!(is_color_field("operatorButtonColor"));
        assert!(!is_color_field("fontSize"));
    }

    #[test]
    fn color_rule_by_key() {
        assert!(color_value_ok("backgroundColor", &json!("#000000")));
        assert!(!color_value_ok("backgroundColor", &json!("black")));
        assert!(color_value_ok("backgroundGradient", &json!(["#000000", "#FFFFFF"])));
        assert!(!color_value_ok("backgroundGradient", &json!("#000000")));
        assert!(color_value_ok("fontSize", &json!(24.0)));
    }

    #[test]
    fn default_theme_is_named_custom() {
        assert_eq!(Theme::default().name(), Some(DEFAULT_THEME_NAME));
    }

    #[test]
    fn transparent_serde() {
        let theme: Theme = serde_json::from_value(json!({"name": "Dark", "fontSize": 24})).unwrap();
        assert_eq!(theme.name(), Some("Dark"));
        assert_eq!(serde_json::to_value(&theme).unwrap()["fontSize"], json!(24));
    }
}
