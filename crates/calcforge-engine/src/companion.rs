//! Companion buttons for multi-parameter functions
//!
//! A `multiParamFunction` button is useless without a way to separate its
//! parameters and to execute it. This stage makes sure both exist.

use crate::diagnostics::{Diagnostic, Diagnostics};
use calcforge_descriptor::{Action, ActionKind, Button, Descriptor, GridPosition};
use std::collections::BTreeSet;

/// Id given to a synthesized separator
pub const SEPARATOR_ID: &str = "btn_param_separator";

/// Id given to a synthesized execute button
pub const EXECUTE_ID: &str = "btn_function_execute";

const SEPARATOR_LABEL: &str = ",";
const EXECUTE_LABEL: &str = "EXE";
const SEPARATOR_KIND: &str = "secondary";
const EXECUTE_KIND: &str = "operator";

/// Guarantee exactly one separator and at least one execute button
///
/// Only applies when a `multiParamFunction` button exists. Surplus separators
/// stay in place but fall back to [`Action::noop`] (first kept). Missing companions go on a new row below the
/// grid starting at the rightmost occupied column, separator first. Ids in
/// `reserved` are never used for synthesized buttons.
#[must_use]
pub fn ensure_companions(
    mut descriptor: Descriptor,
    reserved: &BTreeSet<String>,
    diagnostics: &mut Diagnostics,
) -> Descriptor {
    let layout = &mut descriptor.layout;
    let has_function = layout
        .buttons
        .iter()
        .any(|b| b.action_kind() == ActionKind::MultiParamFunction);
    if !has_function {
        return descriptor;
    }

    let mut seen_separator = false;
    for button in &mut layout.buttons {
        if button.action_kind() != ActionKind::ParameterSeparator {
            continue;
        }
        if seen_separator {
            tracing::debug!("Demoted duplicate separator '{}'", button.id);
            diagnostics.push(Diagnostic::DuplicateCompanionDemoted {
                id: button.id.clone(),
            });
            button.action = Action::noop();
        }
        seen_separator = true;
    }

    let has_execute = layout
        .buttons
        .iter()
        .any(|b| b.action_kind() == ActionKind::FunctionExecute);
    if seen_separator && has_execute {
        layout.recompute_extent();
        return descriptor;
    }

    let row = layout.max_row().map_or(1, |r| r.saturating_add(1));
    let mut column = layout.max_column().unwrap_or(0);
    let mut taken: BTreeSet<String> = layout.buttons.iter().map(|b| b.id.clone()).collect();
    taken.extend(reserved.iter().cloned());

    let mut missing = Vec::with_capacity(2);
    if !seen_separator {
        missing.push((SEPARATOR_ID, SEPARATOR_LABEL, Action::ParameterSeparator, SEPARATOR_KIND));
    }
    if !has_execute {
        missing.push((EXECUTE_ID, EXECUTE_LABEL, Action::FunctionExecute, EXECUTE_KIND));
    }

    for (stem, label, action, kind) in missing {
        let id = unique_id(stem, &taken);
        tracing::info!("Inserted {} companion '{}' at ({}, {})", action.kind(), id, row, column);
        diagnostics.push(Diagnostic::CompanionInserted {
            id: id.clone(),
            action: action.kind().as_str().to_string(),
        });
        taken.insert(id.clone());
        layout.buttons.push(
            Button::new(id, label, action, GridPosition::new(row, column)).with_kind(kind),
        );
        column = column.saturating_add(1);
    }

    layout.recompute_extent();
    descriptor
}

/// First of `stem`, `stem_2`, `stem_3`, ... not in `taken`
fn unique_id(stem: &str, taken: &BTreeSet<String>) -> String {
    if !taken.contains(stem) {
        return stem.to_string();
    }
    (2u32..)
        .map(|n| format!("{stem}_{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| stem.to_string())
}
