//! Partial merge of a patch onto a base descriptor
//!
//! Works on JSON values so that malformed patch fields survive long enough
//! for the sanitizer to decide whether to repair or drop them.
//!
//! # Rules
//!
//! - A patch leaf wins only if it is not a placeholder (see [`is_placeholder`])
//! - Objects deep-merge; a button `action` of a different `type` replaces the
//!   base action wholesale
//! - Arrays are replaced, except `layout.buttons`, which merges by `id`
//! - `id` and `createdAt` always come from the base when there is one

use calcforge_descriptor::keys;
use serde_json::{Map, Value};

/// Action tag whose payload key has a legacy alias
const MULTI_PARAM_TYPE: &str = "multiParamFunction";

/// Check for a value meaning "no opinion"
///
/// `null`, `""`, `{}` and `[]`. Whitespace-only strings are real values.
#[must_use]
pub fn is_placeholder(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Merge `patch` onto `base`
///
/// With no base the patch is merged onto an empty document, which drops its
/// placeholders. Buttons in `layout.buttons` that are not objects are skipped.
#[must_use]
pub fn merge(base: Option<&Value>, patch: &Map<String, Value>) -> Value {
    let mut merged = match base {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    let has_base = base.is_some();

    for (key, value) in patch {
        match key.as_str() {
            keys::ID | keys::CREATED_AT if has_base => {}
            keys::LAYOUT => merge_layout(&mut merged, value),
            _ => merge_entry(&mut merged, key, value),
        }
    }

    Value::Object(merged)
}

fn merge_layout(merged: &mut Map<String, Value>, patch: &Value) {
    let Value::Object(patch_layout) = patch else {
        merge_entry(merged, keys::LAYOUT, patch);
        return;
    };
    if patch_layout.is_empty() {
        return;
    }

    let layout = merged
        .entry(keys::LAYOUT)
        .or_insert_with(|| Value::Object(Map::new()));
    if !layout.is_object() {
        *layout = Value::Object(Map::new());
    }
    let Value::Object(layout) = layout else {
        return;
    };

    for (key, value) in patch_layout {
        match (key.as_str(), value) {
            (keys::BUTTONS, Value::Array(patch_buttons)) if !patch_buttons.is_empty() => {
                let buttons = layout
                    .entry(keys::BUTTONS)
                    .or_insert_with(|| Value::Array(Vec::new()));
                if !buttons.is_array() {
                    *buttons = Value::Array(Vec::new());
                }
                if let Value::Array(buttons) = buttons {
                    merge_buttons(buttons, patch_buttons);
                }
            }
            _ => merge_entry(layout, key, value),
        }
    }
}

/// Merge button lists by `id`
///
/// Base order is kept, unknown ids are appended in patch order, and repeated
/// ids within the patch fold onto the first occurrence.
fn merge_buttons(buttons: &mut Vec<Value>, patch: &[Value]) {
    for entry in patch {
        let Value::Object(patch_button) = entry else {
            continue;
        };

        let id = patch_button
            .get(keys::ID)
            .and_then(Value::as_str)
            .filter(|id| !id.trim().is_empty());

        let existing = id.and_then(|id| {
            buttons
                .iter_mut()
                .find(|b| b.get(keys::ID).and_then(Value::as_str) == Some(id))
        });

        match existing {
            Some(Value::Object(target)) => merge_button(target, patch_button),
            Some(target) => *target = new_button(patch_button),
            None => buttons.push(new_button(patch_button)),
        }
    }
}

fn new_button(patch: &Map<String, Value>) -> Value {
    let mut button = Map::new();
    if let Some(id) = patch.get(keys::ID).filter(|id| !is_placeholder(id)) {
        button.insert(keys::ID.to_string(), id.clone());
    }
    merge_button(&mut button, patch);
    Value::Object(button)
}

fn merge_button(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        match key.as_str() {
            keys::ID => {}
            keys::ACTION => merge_action(target, value),
            _ => merge_entry(target, key, value),
        }
    }
}

fn merge_action(button: &mut Map<String, Value>, patch: &Value) {
    if is_placeholder(patch) {
        return;
    }
    let patch = canonical_action(patch);

    let tag = |v: &Value| v.get(keys::TYPE).and_then(Value::as_str).map(str::to_owned);
    let same_type = match (button.get(keys::ACTION), &patch) {
        (Some(base), Value::Object(p)) if base.is_object() => {
            !p.contains_key(keys::TYPE) || tag(base) == tag(&patch)
        }
        _ => false,
    };

    if same_type {
        merge_entry(button, keys::ACTION, &patch);
    } else {
        button.insert(keys::ACTION.to_string(), fresh(&patch));
    }
}

/// Rewrite `multiParamFunction.value` to its canonical `name` key
fn canonical_action(action: &Value) -> Value {
    let mut action = action.clone();
    if let Value::Object(map) = &mut action {
        if map.get(keys::TYPE).and_then(Value::as_str) == Some(MULTI_PARAM_TYPE)
            && !map.contains_key("name")
        {
            if let Some(name) = map.remove("value") {
                map.insert("name".to_string(), name);
            }
        }
    }
    action
}

fn merge_entry(target: &mut Map<String, Value>, key: &str, patch: &Value) {
    if is_placeholder(patch) {
        return;
    }
    match target.get_mut(key) {
        Some(existing) => merge_value(existing, patch),
        None => {
            target.insert(key.to_string(), fresh(patch));
        }
    }
}

fn merge_value(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                merge_entry(target, key, value);
            }
        }
        (target, patch) => *target = fresh(patch),
    }
}

/// Copy of a patch value with placeholder object members removed
fn fresh(patch: &Value) -> Value {
    match patch {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !is_placeholder(v))
                .map(|(k, v)| (k.clone(), fresh(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(base: Option<Value>, patch: Value) -> Value {
        merge(base.as_ref(), patch.as_object().unwrap())
    }

    fn base() -> Value {
        json!({
            "id": "calc",
            "name": "Base",
            "createdAt": "2024-01-01T00:00:00Z",
            "theme": {"name": "Dark", "backgroundColor": "#000000", "fontSize": 24},
            "layout": {"rows": 3, "columns": 2, "buttons": [
                {"id": "btn_1", "label": "1", "action": {"type": "input", "value": "1"},
                 "gridPosition": {"row": 1, "column": 0}, "fontSize": 24},
                {"id": "btn_2", "label": "2", "action": {"type": "input", "value": "2"},
                 "gridPosition": {"row": 2, "column": 1}}
            ]},
            "tags": ["a", "b"]
        })
    }

    #[test]
    fn placeholders() {
        assert!(is_placeholder(&json!(null)));
        assert!(is_placeholder(&json!("")));
        assert!(is_placeholder(&json!({})));
        assert!(is_placeholder(&json!([])));
        assert!(!is_placeholder(&json!("  ")));
        assert!(!is_placeholder(&json!(0)));
        assert!(!is_placeholder(&json!(false)));
    }

    #[test]
    fn placeholders_inherit() {
        let merged = run(
            Some(base()),
            json!({"name": "", "theme": {"backgroundColor": null, "fontSize": 30}, "tags": []}),
        );
        assert_eq!(merged["name"], json!("Base"));
        assert_eq!(merged["theme"]["backgroundColor"], json!("#000000"));
        assert_eq!(merged["theme"]["fontSize"], json!(30));
        assert_eq!(merged["tags"], json!(["a", "b"]));
    }

    #[test]
    fn whitespace_string_overrides() {
        let merged = run(Some(base()), json!({"name": "   "}));
        assert_eq!(merged["name"], json!("   "));
    }

    #[test]
    fn identity_fields_come_from_base() {
        let merged = run(Some(base()), json!({"id": "other", "createdAt": "later"}));
        assert_eq!(merged["id"], json!("calc"));
        assert_eq!(merged["createdAt"], json!("2024-01-01T00:00:00Z"));

        let merged = run(None, json!({"id": "other"}));
        assert_eq!(merged["id"], json!("other"));
    }

    #[test]
    fn non_empty_arrays_replace() {
        let merged = run(Some(base()), json!({"tags": ["c"]}));
        assert_eq!(merged["tags"], json!(["c"]));
    }

    #[test]
    fn buttons_merge_by_id() {
        let merged = run(
            Some(base()),
            json!({"layout": {"rows": 9, "buttons": [
                {"id": "btn_1", "fontSize": 30, "label": ""},
                "garbage",
                {"id": "btn_new", "label": "N", "action": {"type": "equals"},
                 "gridPosition": {"row": 3, "column": 0}, "customColor": null},
                {"id": "btn_new", "fontSize": 12}
            ]}}),
        );
        let buttons = merged["layout"]["buttons"].as_array().unwrap();
        assert_eq!(buttons.len(), 3);
        assert_eq!(buttons[0]["fontSize"], json!(30));
        assert_eq!(buttons[0]["label"], json!("1"));
        assert_eq!(buttons[1], base()["layout"]["buttons"][1]);
        assert_eq!(
            buttons[2],
            json!({"id": "btn_new", "label": "N", "action": {"type": "equals"},
                   "gridPosition": {"row": 3, "column": 0}, "fontSize": 12})
        );
        assert_eq!(merged["layout"]["rows"], json!(9));
    }

    #[test]
    fn empty_button_list_keeps_base() {
        let merged = run(Some(base()), json!({"layout": {"buttons": []}}));
        assert_eq!(merged["layout"]["buttons"], base()["layout"]["buttons"]);
    }

    #[test]
    fn action_type_change_replaces_wholesale() {
        let merged = run(
            Some(base()),
            json!({"layout": {"buttons": [
                {"id": "btn_1", "action": {"type": "multiParamFunction", "value": "pow"}},
                {"id": "btn_2", "action": {"value": "7"}}
            ]}}),
        );
        let buttons = &merged["layout"]["buttons"];
        assert_eq!(buttons[0]["action"], json!({"type": "multiParamFunction", "name": "pow"}));
        assert_eq!(buttons[1]["action"], json!({"type": "input", "value": "7"}));
    }

    #[test]
    fn new_button_action_alias_is_canonical() {
        let merged = run(
            None,
            json!({"layout": {"buttons": [
                {"id": "btn_log", "label": "log", "action": {"type": "multiParamFunction", "value": "log"}}
            ]}}),
        );
        assert_eq!(
            merged["layout"]["buttons"][0]["action"],
            json!({"type": "multiParamFunction", "name": "log"})
        );
    }

    #[test]
    fn grid_position_deep_merges() {
        let merged = run(
            Some(base()),
            json!({"layout": {"buttons": [{"id": "btn_2", "gridPosition": {"row": 5}}]}}),
        );
        assert_eq!(
            merged["layout"]["buttons"][1]["gridPosition"],
            json!({"row": 5, "column": 1})
        );
    }

    #[test]
    fn no_base_prunes_placeholders() {
        let merged = run(
            None,
            json!({"name": "", "theme": {"name": "Neon", "fontSize": null}, "layout": {"buttons": [
                {"id": "", "label": "x"}
            ]}}),
        );
        assert_eq!(
            merged,
            json!({"theme": {"name": "Neon"}, "layout": {"buttons": [{"label": "x"}]}})
        );
    }

    #[test]
    fn merge_is_idempotent_on_its_output() {
        let patch = json!({"theme": {"fontSize": 28}, "layout": {"buttons": [
            {"id": "btn_1", "fontSize": 30},
            {"id": "btn_9", "label": "9", "action": {"type": "input", "value": "9"},
             "gridPosition": {"row": 3, "column": 1}}
        ]}});
        let once = run(Some(base()), patch.clone());
        let twice = run(Some(once.clone()), patch);
        assert_eq!(once, twice);
    }
}
