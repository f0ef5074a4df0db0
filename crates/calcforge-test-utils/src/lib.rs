//! Testing utilities for calcforge workspace
//!
//! Shared descriptor fixtures and button builders.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use calcforge_descriptor::Descriptor;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};

/// Fixed request time used across tests
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
}

/// Embedded PNG payload tagged for identification in assertions
pub fn image_data(tag: &str) -> String {
    format!("data:image/png;base64,{tag}")
}

pub fn button_json(id: &str, label: &str, action: Value, row: u32, column: u32) -> Value {
    json!({
        "id": id,
        "label": label,
        "action": action,
        "gridPosition": {"row": row, "column": column},
    })
}

pub fn input_button(id: &str, digit: &str, row: u32, column: u32) -> Value {
    button_json(id, digit, json!({"type": "input", "value": digit}), row, column)
}

pub fn operator_button(id: &str, label: &str, op: &str, row: u32, column: u32) -> Value {
    let mut button = button_json(id, label, json!({"type": "operator", "value": op}), row, column);
    button["type"] = json!("operator");
    button
}

pub fn pow_button(row: u32, column: u32) -> Value {
    let mut button = button_json(
        "btn_pow",
        "xʸ",
        json!({"type": "multiParamFunction", "name": "pow"}),
        row,
        column,
    );
    button["type"] = json!("special");
    button
}

/// Small descriptor carrying image payloads on a button, the theme and
/// the app background
pub fn image_base() -> Descriptor {
    let mut one = input_button("btn_1", "1", 1, 0);
    one["backgroundImage"] = json!(image_data("ONE"));
    one["fontSize"] = json!(24);

    Descriptor::from_value(json!({
        "id": "calc-images",
        "name": "Sunset",
        "description": "Warm calculator",
        "theme": {
            "name": "Sunset",
            "backgroundColor": "#1A1A1A",
            "displayTextColor": "#FFFFFF",
            "backgroundImage": image_data("THEME"),
            "fontSize": 24
        },
        "layout": {
            "rows": 2,
            "columns": 4,
            "buttons": [
                one,
                input_button("btn_2", "2", 1, 1),
                operator_button("btn_add", "+", "+", 1, 2),
                button_json("btn_equals", "=", json!({"type": "equals"}), 1, 3)
            ]
        },
        "appBackground": {
            "backgroundImageUrl": image_data("APP"),
            "backgroundOpacity": 0.6
        },
        "version": "1.0.0",
        "createdAt": "2024-01-01T00:00:00Z",
        "authorPrompt": "sunset colors"
    }))
    .unwrap()
}

/// Base with exactly `btn_1`, `btn_add` and `btn_equals`
pub fn minimal_base() -> Descriptor {
    Descriptor::from_value(json!({
        "id": "calc-minimal",
        "name": "Minimal",
        "theme": {"name": "Minimal", "backgroundColor": "#000000"},
        "layout": {
            "rows": 2,
            "columns": 3,
            "buttons": [
                input_button("btn_1", "1", 1, 0),
                operator_button("btn_add", "+", "+", 1, 1),
                button_json("btn_equals", "=", json!({"type": "equals"}), 1, 2)
            ]
        },
        "createdAt": "2024-01-01T00:00:00Z"
    }))
    .unwrap()
}

/// The seventeen keys of a basic calculator laid out on a 5 x 4 grid
///
/// Digits, decimal point, four operators, equals and clear-all.
pub fn standard_buttons() -> Vec<Value> {
    vec![
        button_json("btn_ac", "AC", json!({"type": "clearAll"}), 1, 0),
        operator_button("btn_div", "÷", "/", 1, 3),
        input_button("btn_7", "7", 2, 0),
        input_button("btn_8", "8", 2, 1),
        input_button("btn_9", "9", 2, 2),
        operator_button("btn_mul", "×", "*", 2, 3),
        input_button("btn_4", "4", 3, 0),
        input_button("btn_5", "5", 3, 1),
        input_button("btn_6", "6", 3, 2),
        operator_button("btn_sub", "-", "-", 3, 3),
        input_button("btn_1", "1", 4, 0),
        input_button("btn_2", "2", 4, 1),
        input_button("btn_3", "3", 4, 2),
        operator_button("btn_add", "+", "+", 4, 3),
        input_button("btn_0", "0", 5, 0),
        button_json("btn_decimal", ".", json!({"type": "decimal"}), 5, 1),
        button_json("btn_equals", "=", json!({"type": "equals"}), 5, 2),
    ]
}

/// A full patch: standard keys plus a `pow` button and no companions
pub fn scientific_patch() -> Value {
    let mut buttons = standard_buttons();
    buttons.push(pow_button(1, 1));
    json!({
        "name": "Scientific",
        "theme": {"name": "Scientific", "backgroundColor": "#101820"},
        "layout": {"rows": 6, "columns": 4, "buttons": buttons}
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_decode() {
        assert_eq!(image_base().layout.buttons.len(), 4);
        assert_eq!(minimal_base().layout.buttons.len(), 3);
        assert_eq!(standard_buttons().len(), 17);
        assert_eq!(scientific_patch()["layout"]["buttons"].as_array().unwrap().len(), 18);
    }
}
