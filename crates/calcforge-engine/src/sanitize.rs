//! Button validation and descriptor sanitizing
//!
//! Turns the merged JSON document back into a typed [`Descriptor`]. Buttons
//! the base already had are trusted and repaired in place; buttons the patch
//! introduced must pass every check or they are dropped.

use crate::config::{EngineConfig, GridBounds};
use crate::diagnostics::{Diagnostic, Diagnostics, DropReason, RepairedField};
use calcforge_descriptor::{
    color_value_ok, is_color_field, is_gradient_field, keys, label_slug, Action, ActionKind,
    AppBackground, Button, Descriptor, GridPosition, Layout, Theme, DEFAULT_BUTTON_KIND,
    DEFAULT_THEME_NAME, DEFAULT_VERSION,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashSet};

/// Prefix of ids given to descriptors created without a base
pub const GENERATED_ID_PREFIX: &str = "ai-generated-";

/// Label pairs treated as the same key by the basic-button check
const LABEL_ALIASES: [(&str, &str); 2] = [("×", "*"), ("÷", "/")];

/// Result of sanitizing a merged document
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized {
    /// The typed, valid descriptor
    pub descriptor: Descriptor,
    /// Ids of patch-introduced buttons that were dropped
    pub rejected_ids: BTreeSet<String>,
}

/// Validates a merged document against the descriptor model
#[derive(Debug, Clone)]
pub struct Sanitizer<'a> {
    config: &'a EngineConfig,
    base: Option<&'a Descriptor>,
    requested_at: DateTime<Utc>,
    author_prompt: Option<&'a str>,
}

impl<'a> Sanitizer<'a> {
    /// Create a sanitizer for one request
    ///
    /// Buttons whose id exists in `base` are treated as preserved.
    #[must_use]
    pub fn new(
        config: &'a EngineConfig,
        base: Option<&'a Descriptor>,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            config,
            base,
            requested_at,
            author_prompt: None,
        }
    }

    /// With the prompt that produced the patch
    #[must_use]
    pub fn with_author_prompt(mut self, prompt: Option<&'a str>) -> Self {
        self.author_prompt = prompt;
        self
    }

    /// Sanitize a merged document
    ///
    /// Never fails: every field falls back to the base value, then to a
    /// default, and every fallback is reported.
    #[must_use]
    pub fn sanitize(&self, merged: Value, diagnostics: &mut Diagnostics) -> Sanitized {
        let mut doc = match merged {
            Value::Object(map) => map,
            other => {
                diagnostics.push(Diagnostic::FieldDropped {
                    path: "$".to_string(),
                    reason: format!("expected an object, got {}", crate::error::json_kind(&other)),
                });
                Map::new()
            }
        };

        let id = self.identity(&mut doc, diagnostics);
        let created_at = self.created_at(&mut doc, diagnostics);
        let name = self.field(&mut doc, keys::NAME, diagnostics, |b| b.name.clone(), || {
            DEFAULT_THEME_NAME.to_string()
        });
        let description = self.field(
            &mut doc,
            keys::DESCRIPTION,
            diagnostics,
            |b| b.description.clone(),
            String::new,
        );
        let version = self.field(&mut doc, keys::VERSION, diagnostics, |b| b.version.clone(), || {
            DEFAULT_VERSION.to_string()
        });

        let mut theme: Theme = self.field(
            &mut doc,
            keys::THEME,
            diagnostics,
            |b| b.theme.clone(),
            Theme::default,
        );
        if theme.name().is_none() {
            theme.insert("name", Value::String(DEFAULT_THEME_NAME.to_string()));
        }
        self.check_theme_colors(&mut theme, diagnostics);

        let mut app_background: Option<AppBackground> = self.field(
            &mut doc,
            keys::APP_BACKGROUND,
            diagnostics,
            |b| b.app_background.clone(),
            || None,
        );
        if let Some(bg) = app_background.as_mut() {
            self.check_background_colors(bg, diagnostics);
        }

        let author_prompt = match decode::<String>(doc.remove(keys::AUTHOR_PROMPT)) {
            Some(prompt) if !prompt.is_empty() => Some(prompt),
            _ => self
                .base
                .and_then(|b| b.author_prompt.clone())
                .or_else(|| self.author_prompt.map(str::to_owned)),
        };

        let (layout, rejected_ids) = self.layout(doc.remove(keys::LAYOUT), diagnostics);
        self.check_required_labels(&layout, diagnostics);

        Sanitized {
            descriptor: Descriptor {
                id,
                name,
                description,
                theme,
                layout,
                app_background,
                version,
                created_at,
                author_prompt,
                extra: doc,
            },
            rejected_ids,
        }
    }

    fn identity(&self, doc: &mut Map<String, Value>, diagnostics: &mut Diagnostics) -> String {
        let raw = doc.remove(keys::ID);
        if let Some(base) = self.base {
            return base.id.clone();
        }
        match raw {
            Some(Value::String(id)) if !id.trim().is_empty() => id,
            Some(other) => {
                diagnostics.push(invalid_field(keys::ID, &other));
                self.generated_id()
            }
            None => self.generated_id(),
        }
    }

    fn generated_id(&self) -> String {
        format!("{GENERATED_ID_PREFIX}{}", self.requested_at.timestamp())
    }

    fn created_at(&self, doc: &mut Map<String, Value>, diagnostics: &mut Diagnostics) -> String {
        let raw = doc.remove(keys::CREATED_AT);
        if let Some(base) = self.base {
            return base.created_at.clone();
        }
        match raw {
            Some(Value::String(ts)) if !ts.trim().is_empty() => ts,
            Some(other) => {
                diagnostics.push(invalid_field(keys::CREATED_AT, &other));
                self.requested_at.to_rfc3339_opts(SecondsFormat::Secs, true)
            }
            None => self.requested_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Decode a top-level field, falling back to the base, then a default
    fn field<T: DeserializeOwned>(
        &self,
        doc: &mut Map<String, Value>,
        key: &str,
        diagnostics: &mut Diagnostics,
        from_base: impl FnOnce(&Descriptor) -> T,
        default: impl FnOnce() -> T,
    ) -> T {
        if let Some(raw) = doc.remove(key) {
            match serde_json::from_value::<T>(raw.clone()) {
                Ok(value) => return value,
                Err(_) => diagnostics.push(invalid_field(key, &raw)),
            }
        }
        self.base.map_or_else(default, from_base)
    }

    fn check_theme_colors(&self, theme: &mut Theme, diagnostics: &mut Diagnostics) {
        let base = self.base.map(|b| &b.theme);
        let bad = invalid_colors(theme.props(), base.map(Theme::props));
        for key in bad {
            let fallback = base
                .and_then(|t| t.get(&key))
                .filter(|v| color_value_ok(&key, v))
                .cloned();
            report_color(keys::THEME, &key, fallback.is_some(), diagnostics);
            match fallback {
                Some(v) => theme.insert(key, v),
                None => theme.remove(&key),
            };
        }
    }

    fn check_background_colors(&self, bg: &mut AppBackground, diagnostics: &mut Diagnostics) {
        let base = self.base.and_then(|b| b.app_background.as_ref());
        let bad = invalid_colors(bg.props(), base.map(AppBackground::props));
        for key in bad {
            let fallback = base
                .and_then(|b| b.get(&key))
                .filter(|v| color_value_ok(&key, v))
                .cloned();
            report_color(keys::APP_BACKGROUND, &key, fallback.is_some(), diagnostics);
            match fallback {
                Some(v) => bg.insert(key, v),
                None => bg.remove(&key),
            };
        }
    }

    fn layout(
        &self,
        raw: Option<Value>,
        diagnostics: &mut Diagnostics,
    ) -> (Layout, BTreeSet<String>) {
        let mut layout_map = match raw {
            Some(Value::Object(map)) => map,
            Some(other) => {
                diagnostics.push(invalid_field(keys::LAYOUT, &other));
                return (self.base_layout(), BTreeSet::new());
            }
            None => return (self.base_layout(), BTreeSet::new()),
        };

        layout_map.remove(keys::ROWS);
        layout_map.remove(keys::COLUMNS);
        let raw_buttons = match layout_map.remove(keys::BUTTONS) {
            Some(Value::Array(buttons)) => buttons,
            None | Some(Value::Null) => Vec::new(),
            Some(other) => {
                diagnostics.push(invalid_field("layout.buttons", &other));
                let mut layout = self.base_layout();
                layout.extra = layout_map;
                return (layout, BTreeSet::new());
            }
        };

        let (buttons, rejected) = self.buttons(raw_buttons, diagnostics);
        let mut layout = Layout {
            rows: 0,
            columns: 0,
            buttons,
            extra: layout_map,
        };
        layout.recompute_extent();
        (layout, rejected)
    }

    fn base_layout(&self) -> Layout {
        let mut layout = self.base.map(|b| b.layout.clone()).unwrap_or_default();
        layout.recompute_extent();
        layout
    }

    fn buttons(
        &self,
        raw: Vec<Value>,
        diagnostics: &mut Diagnostics,
    ) -> (Vec<Button>, BTreeSet<String>) {
        let mut kept: Vec<Button> = Vec::with_capacity(raw.len());
        let mut ids: HashSet<String> = HashSet::new();
        let mut labels: HashSet<String> = HashSet::new();
        let mut has_separator = false;
        let mut rejected = BTreeSet::new();

        for entry in raw {
            let Value::Object(props) = entry else {
                drop_button(None, DropReason::NotAnObject, diagnostics);
                continue;
            };

            let Some(id) = props
                .get(keys::ID)
                .and_then(Value::as_str)
                .filter(|id| !id.trim().is_empty())
                .map(str::to_owned)
            else {
                drop_button(None, DropReason::MissingId, diagnostics);
                continue;
            };

            if ids.contains(&id) {
                drop_button(Some(&id), DropReason::DuplicateId, diagnostics);
                continue;
            }

            let base_button = self.base.and_then(|b| b.layout.button(&id));
            let button = if let Some(base_button) = base_button {
                let mut button =
                    repair_button(id.clone(), props, base_button, &self.config.grid, diagnostics);
                if has_separator
                    && button.action_kind() == ActionKind::ParameterSeparator
                    && base_button.action_kind() != ActionKind::ParameterSeparator
                {
                    tracing::debug!("Reverted second separator '{}' to its base action", id);
                    diagnostics.push(Diagnostic::ButtonRepaired {
                        id: id.clone(),
                        field: RepairedField::Action,
                    });
                    button.action = base_button.action.clone();
                }
                button
            } else {
                let checked = validate_new(id.clone(), props, &self.config.grid).and_then(|b| {
                    let label = b.label.trim().to_string();
                    if labels.contains(&label) {
                        Err(DropReason::DuplicateLabel(label))
                    } else if has_separator && b.action_kind() == ActionKind::ParameterSeparator {
                        Err(DropReason::DuplicateSeparator)
                    } else {
                        Ok(b)
                    }
                });
                match checked {
                    Ok(button) => button,
                    Err(reason) => {
                        drop_button(Some(&id), reason, diagnostics);
                        rejected.insert(id);
                        continue;
                    }
                }
            };

            has_separator |= button.action_kind() == ActionKind::ParameterSeparator;
            labels.insert(button.label.trim().to_string());
            ids.insert(id);
            kept.push(button);
        }

        (kept, rejected)
    }

    fn check_required_labels(&self, layout: &Layout, diagnostics: &mut Diagnostics) {
        if self.config.required_labels.is_empty() {
            return;
        }
        let present: HashSet<&str> = layout.buttons.iter().map(|b| b.label.trim()).collect();
        for label in &self.config.required_labels {
            let alias = LABEL_ALIASES.iter().find_map(|&(a, b)| match label.as_str() {
                l if l == a => Some(b),
                l if l == b => Some(a),
                _ => None,
            });
            let found = present.contains(label.as_str()) || alias.is_some_and(|a| present.contains(a));
            if !found {
                tracing::debug!("Missing basic button '{}'", label);
                diagnostics.push(Diagnostic::MissingBasicButton {
                    label: label.clone(),
                });
            }
        }
    }
}

/// Check a button the patch introduced
fn validate_new(
    id: String,
    mut props: Map<String, Value>,
    bounds: &GridBounds,
) -> Result<Button, DropReason> {
    props.remove(keys::ID);

    let label = match props.remove(keys::LABEL) {
        Some(Value::String(label)) if !label.trim().is_empty() => label,
        _ => return Err(DropReason::EmptyLabel),
    };

    let action = match props.remove(keys::ACTION) {
        Some(raw) => serde_json::from_value::<Action>(raw)
            .map_err(|e| DropReason::InvalidAction(e.to_string()))?,
        None => return Err(DropReason::InvalidAction("missing action".to_string())),
    };
    action
        .validate_payload()
        .map_err(|e| DropReason::InvalidAction(e.to_string()))?;

    let grid_position = props
        .remove(keys::GRID_POSITION)
        .and_then(|raw| decode::<GridPosition>(Some(raw)))
        .filter(|pos| pos.column_span != Some(0))
        .ok_or(DropReason::InvalidGridPosition)?;
    if !bounds.contains(&grid_position) {
        return Err(DropReason::OutOfBounds {
            row: grid_position.row,
            column: grid_position.column,
        });
    }

    let kind = take_kind(&mut props);
    Ok(Button {
        id,
        label,
        action,
        grid_position,
        kind,
        props,
    })
}

/// Repair a button the base already had; never drops it
///
/// A position the patch moved out of `bounds`, or one that no longer decodes,
/// reverts to the base position. Unmoved positions are not bounds-checked.
fn repair_button(
    id: String,
    mut props: Map<String, Value>,
    base: &Button,
    bounds: &GridBounds,
    diagnostics: &mut Diagnostics,
) -> Button {
    props.remove(keys::ID);
    let mut repaired = |field: RepairedField| {
        tracing::debug!("Repaired {} of button '{}'", field, id);
        diagnostics.push(Diagnostic::ButtonRepaired {
            id: id.clone(),
            field,
        });
    };

    let label = match props.remove(keys::LABEL) {
        Some(Value::String(label)) if !label.trim().is_empty() => label,
        _ => {
            repaired(RepairedField::Label);
            label_slug(&id)
        }
    };

    let action = decode::<Action>(props.remove(keys::ACTION)).unwrap_or_else(|| {
        repaired(RepairedField::Action);
        Action::noop()
    });

    let grid_position = decode::<GridPosition>(props.remove(keys::GRID_POSITION))
        .filter(|pos| pos.column_span != Some(0))
        .filter(|pos| *pos == base.grid_position || bounds.contains(pos))
        .unwrap_or_else(|| {
            repaired(RepairedField::GridPosition);
            Some(base.grid_position)
                .filter(|pos| pos.column_span != Some(0))
                .unwrap_or_default()
        });

    let kind = take_kind(&mut props);
    Button {
        id,
        label,
        action,
        grid_position,
        kind,
        props,
    }
}

fn take_kind(props: &mut Map<String, Value>) -> String {
    match props.remove(keys::TYPE) {
        Some(Value::String(kind)) if !kind.trim().is_empty() => kind,
        _ => DEFAULT_BUTTON_KIND.to_string(),
    }
}

fn decode<T: DeserializeOwned>(raw: Option<Value>) -> Option<T> {
    raw.and_then(|v| serde_json::from_value(v).ok())
}

fn drop_button(id: Option<&str>, reason: DropReason, diagnostics: &mut Diagnostics) {
    tracing::debug!("Dropped button {:?}: {}", id, reason);
    diagnostics.push(Diagnostic::ButtonDropped {
        id: id.map(str::to_owned),
        reason,
    });
}

fn invalid_field(path: &str, value: &Value) -> Diagnostic {
    Diagnostic::FieldDropped {
        path: path.to_string(),
        reason: format!("unexpected {}", crate::error::json_kind(value)),
    }
}

/// Color keys whose value changed relative to the base and breaks the rule
fn invalid_colors(props: &Map<String, Value>, base: Option<&Map<String, Value>>) -> Vec<String> {
    props
        .iter()
        .filter(|(key, _)| is_color_field(key) || is_gradient_field(key))
        .filter(|(key, value)| base.and_then(|b| b.get(key.as_str())) != Some(*value))
        .filter(|(key, value)| !color_value_ok(key, value))
        .map(|(key, _)| key.clone())
        .collect()
}

fn report_color(section: &str, key: &str, reverted: bool, diagnostics: &mut Diagnostics) {
    let reason = if reverted {
        "not a #RRGGBB color, reverted to base"
    } else {
        "not a #RRGGBB color"
    };
    diagnostics.push(Diagnostic::FieldDropped {
        path: format!("{section}.{key}"),
        reason: reason.to_string(),
    });
}
