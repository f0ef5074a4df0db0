//! calcforge descriptor model
//!
//! Typed representation of the JSON document that configures one calculator.
//!
//! # Core Concepts
//!
//! - [`Descriptor`]: theme, button grid and optional app background
//! - [`Button`] / [`Action`]: keypad entries and their tagged-union behavior
//! - [`FieldPath`]: closed set of templates addressing protectable leaves
//! - [`ContentHash`]: Blake3 fingerprint of a descriptor's canonical JSON
//!
//! # Example
//!
//! ```rust,ignore
//! use calcforge_descriptor::{Descriptor, FieldPath};
//!
//! let descriptor = Descriptor::from_value(json)?;
//! let path: FieldPath = "button.btn_1.backgroundImage".parse()?;
//! println!("{:?} @ {}", descriptor.field(&path), descriptor.fingerprint()?);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod action;
mod button;
mod descriptor;
mod hash;
mod path;
mod theme;

pub use action::{Action, ActionError, ActionKind};
pub use button::{label_slug, Button, GridPosition, DEFAULT_BUTTON_KIND};
pub use descriptor::{keys, Descriptor, Layout, DEFAULT_VERSION};
pub use hash::{ContentHash, HashError};
pub use path::{FieldPath, PathError, STRUCTURAL_BUTTON_FIELDS};
pub use theme::{
    color_value_ok, is_color_field, is_gradient_field, is_hex_color, AppBackground, Theme,
    DEFAULT_THEME_NAME, GRADIENT_COLORS_KEY,
};

/// JSON Schema of [`Descriptor`], for embedding in prompts
#[must_use]
pub fn descriptor_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(Descriptor)
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptor_value_round_trip() {
        let raw = json!({
            "id": "calc",
            "name": "Blue",
            "description": "",
            "theme": {"name": "Blue", "operatorButtonColor": "#0066FF"},
            "layout": {
                "rows": 2,
                "columns": 1,
                "buttons": [
                    {"id": "btn_pow", "label": "xʸ", "action": {"type": "multiParamFunction", "name": "pow"},
                     "gridPosition": {"row": 1, "column": 0}, "type": "special"}
                ]
            },
            "version": "1.0.0",
            "createdAt": "2024-01-01T00:00:00Z"
        });
        let descriptor = Descriptor::from_value(raw.clone()).unwrap();
        assert_eq!(descriptor.to_value().unwrap(), raw);
    }

    #[test]
    fn schema_names_core_properties() {
        let schema = serde_json::to_value(descriptor_schema()).unwrap();
        let props = &schema["properties"];
        assert!(props.get("layout").is_some());
        assert!(props.get("createdAt").is_some());
    }

    #[test]
    fn path_and_descriptor_integration() {
        let path: FieldPath = "appBackground.backgroundImageUrl".parse().unwrap();
        let mut descriptor = Descriptor::empty("calc", "now");
        assert!(descriptor.field(&path).is_none());
        descriptor.set_field(&path, Some(json!("data:image/png;base64,AAA")));
        assert!(descriptor.fingerprint().is_ok());
        assert_eq!(descriptor.field(&path).and_then(|v| v.as_str()), Some("data:image/png;base64,AAA"));
    }
}
