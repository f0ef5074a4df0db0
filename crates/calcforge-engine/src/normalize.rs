//! Color sequence normalization
//!
//! Models describe gradients either as a bare array or as an object with a
//! `colors` key. The merger only understands the array form, so the patch is
//! rewritten before anything else looks at it.

use crate::diagnostics::{Diagnostic, Diagnostics};
use calcforge_descriptor::{is_gradient_field, keys, GRADIENT_COLORS_KEY};
use serde_json::{Map, Value};

/// Canonicalize every color-sequence field of a patch
///
/// Covers `theme`, `appBackground` and each object in `layout.buttons`.
/// Unreconcilable values are removed and reported; this never fails.
#[must_use]
pub fn normalize(mut patch: Map<String, Value>, diagnostics: &mut Diagnostics) -> Map<String, Value> {
    for section in [keys::THEME, keys::APP_BACKGROUND] {
        if let Some(Value::Object(props)) = patch.get_mut(section) {
            normalize_props(props, section, diagnostics);
        }
    }

    let buttons = patch
        .get_mut(keys::LAYOUT)
        .and_then(|layout| layout.get_mut(keys::BUTTONS))
        .and_then(Value::as_array_mut);
    if let Some(buttons) = buttons {
        for (index, button) in buttons.iter_mut().enumerate() {
            let Value::Object(props) = button else {
                continue;
            };
            let prefix = match props.get(keys::ID).and_then(Value::as_str) {
                Some(id) => format!("button.{id}"),
                None => format!("layout.buttons[{index}]"),
            };
            normalize_props(props, &prefix, diagnostics);
        }
    }

    patch
}

fn normalize_props(props: &mut Map<String, Value>, prefix: &str, diagnostics: &mut Diagnostics) {
    let gradient_keys: Vec<String> = props
        .keys()
        .filter(|k| is_gradient_field(k))
        .cloned()
        .collect();

    for key in gradient_keys {
        let Some(value) = props.remove(&key) else {
            continue;
        };
        match canonical_sequence(value) {
            Ok(colors) => {
                props.insert(key, colors);
            }
            Err(None) => {}
            Err(Some(kind)) => {
                diagnostics.push(Diagnostic::FieldDropped {
                    path: format!("{prefix}.{key}"),
                    reason: format!("cannot read color sequence from {kind}"),
                });
            }
        }
    }
}

/// Array form of a color sequence
///
/// `Err(None)` means the value was an empty placeholder and is dropped
/// silently; `Err(Some(kind))` names what could not be reconciled.
fn canonical_sequence(value: Value) -> Result<Value, Option<&'static str>> {
    match value {
        Value::Array(_) => Ok(value),
        Value::Object(mut map) => match map.remove(GRADIENT_COLORS_KEY) {
            Some(colors @ Value::Array(_)) => Ok(colors),
            _ => Err(Some("object without a colors array")),
        },
        Value::Null => Err(None),
        Value::String(_) => Err(Some("string")),
        Value::Number(_) => Err(Some("number")),
        Value::Bool(_) => Err(Some("boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(patch: Value) -> (Value, Diagnostics) {
        let mut diags = Diagnostics::new();
        let map = patch.as_object().cloned().unwrap();
        let out = normalize(map, &mut diags);
        (Value::Object(out), diags)
    }

    #[test]
    fn object_with_colors_becomes_array() {
        let (out, diags) = run(json!({
            "theme": {"backgroundGradient": {"colors": ["#000000", "#333333"], "angle": 45}}
        }));
        assert_eq!(out["theme"]["backgroundGradient"], json!(["#000000", "#333333"]));
        assert!(diags.is_empty());
    }

    #[test]
    fn arrays_are_kept() {
        let (out, _) = run(json!({
            "appBackground": {"backgroundGradient": ["#111111", "#222222"]}
        }));
        assert_eq!(out["appBackground"]["backgroundGradient"], json!(["#111111", "#222222"]));
    }

    #[test]
    fn unreadable_values_are_dropped() {
        let (out, diags) = run(json!({
            "theme": {"displayGradient": "#FF0000", "fontSize": 24},
            "layout": {"buttons": [
                {"id": "btn_1", "gradientColors": {"start": "#000000"}},
                {"gradientColors": 5}
            ]}
        }));
        assert!(out["theme"].get("displayGradient").is_none());
        assert_eq!(out["theme"]["fontSize"], json!(24));
        assert!(out["layout"]["buttons"][0].get("gradientColors").is_none());
        assert!(out["layout"]["buttons"][1].get("gradientColors").is_none());

        let paths: Vec<String> = diags
            .iter()
            .filter_map(|d| match d {
                Diagnostic::FieldDropped { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            paths,
            vec![
                "theme.displayGradient".to_string(),
                "button.btn_1.gradientColors".to_string(),
                "layout.buttons[1].gradientColors".to_string(),
            ]
        );
    }

    #[test]
    fn null_is_dropped_silently() {
        let (out, diags) = run(json!({"theme": {"backgroundGradient": null}}));
        assert!(out["theme"].get("backgroundGradient").is_none());
        assert!(diags.is_empty());
    }

    #[test]
    fn non_gradient_fields_untouched() {
        let patch = json!({"name": "x", "theme": {"backgroundColor": {"colors": ["#000000"]}}});
        let (out, _) = run(patch.clone());
        assert_eq!(out, patch);
    }
}
