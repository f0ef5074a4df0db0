//! Protected field paths
//!
//! A [`ProtectionSet`] is resolved once per request from the base descriptor
//! and the caller's [`ProtectionSpec`]. Writes the patch makes to those
//! leaves are stripped before merge, and the base values are put back after
//! every other stage has run.

use crate::config::ProtectionDefaults;
use crate::diagnostics::{Diagnostic, Diagnostics};
use calcforge_descriptor::{keys, Descriptor, FieldPath, PathError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Button key auto-detection looks at
const BUTTON_IMAGE_KEY: &str = "backgroundImage";

/// Theme keys with this prefix are candidates for auto-detection
const THEME_BACKGROUND_PREFIX: &str = "background";

/// Caller's protection request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProtectionSpec {
    /// Paths to protect; when present and non-empty, used exclusively
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explicit_paths: Option<Vec<String>>,
    /// Scan the base for embedded images when no explicit paths are given
    pub auto_detect: bool,
}

impl ProtectionSpec {
    /// Auto-detect image payloads in the base
    #[must_use]
    pub fn auto() -> Self {
        Self::default()
    }

    /// Protect exactly these paths
    #[must_use]
    pub fn explicit<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            explicit_paths: Some(paths.into_iter().map(Into::into).collect()),
            auto_detect: false,
        }
    }

    /// Protect nothing
    #[must_use]
    pub fn none() -> Self {
        Self {
            explicit_paths: None,
            auto_detect: false,
        }
    }
}

impl Default for ProtectionSpec {
    fn default() -> Self {
        Self {
            explicit_paths: None,
            auto_detect: true,
        }
    }
}

/// Resolved set of protected leaves
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectionSet {
    paths: BTreeSet<FieldPath>,
}

impl ProtectionSet {
    /// Resolve the protected paths for one request
    ///
    /// Explicit paths are always parsed so typos surface, even when there is
    /// no base to protect.
    ///
    /// # Errors
    /// Returns error if an explicit path is not a known template
    pub fn resolve(
        base: Option<&Descriptor>,
        spec: &ProtectionSpec,
        defaults: &ProtectionDefaults,
    ) -> Result<Self, PathError> {
        let explicit = spec
            .explicit_paths
            .iter()
            .flatten()
            .map(|p| p.parse::<FieldPath>())
            .collect::<Result<BTreeSet<_>, _>>()?;

        let Some(base) = base else {
            return Ok(Self::default());
        };

        if !explicit.is_empty() {
            return Ok(Self { paths: explicit });
        }

        if spec.auto_detect {
            return Ok(Self {
                paths: detect_images(base, defaults),
            });
        }

        Ok(Self::default())
    }

    /// Build from already-parsed paths
    #[must_use]
    pub fn from_paths(paths: impl IntoIterator<Item = FieldPath>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    /// Check whether a path is protected
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &FieldPath) -> bool {
        self.paths.contains(path)
    }

    /// Protected paths in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &FieldPath> {
        self.paths.iter()
    }

    /// Number of protected paths
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check for an empty set
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Remove every write the patch makes to a protected leaf
    #[must_use]
    pub fn strip(
        &self,
        mut patch: Map<String, Value>,
        diagnostics: &mut Diagnostics,
    ) -> Map<String, Value> {
        for path in &self.paths {
            let removed = match path {
                FieldPath::Theme { field } => remove_from_section(&mut patch, keys::THEME, field),
                FieldPath::AppBackground { field } => {
                    remove_from_section(&mut patch, keys::APP_BACKGROUND, field)
                }
                FieldPath::Button { id, field } => remove_from_buttons(&mut patch, id, field),
            };

            if removed {
                tracing::warn!("Stripped write to protected path {}", path);
                diagnostics.push(Diagnostic::ProtectedWriteStripped {
                    path: path.to_string(),
                });
            }
        }
        patch
    }

    /// Force every protected leaf of `result` back to its base value
    ///
    /// Leaves absent from the base are removed. Without a base there is
    /// nothing to restore.
    pub fn reassert(&self, result: &mut Descriptor, base: Option<&Descriptor>) {
        let Some(base) = base else {
            return;
        };
        for path in &self.paths {
            result.set_field(path, base.field(path).cloned());
        }
    }
}

fn remove_from_section(patch: &mut Map<String, Value>, section: &str, field: &str) -> bool {
    patch
        .get_mut(section)
        .and_then(Value::as_object_mut)
        .is_some_and(|props| props.remove(field).is_some())
}

fn remove_from_buttons(patch: &mut Map<String, Value>, id: &str, field: &str) -> bool {
    let Some(buttons) = patch
        .get_mut(keys::LAYOUT)
        .and_then(|layout| layout.get_mut(keys::BUTTONS))
        .and_then(Value::as_array_mut)
    else {
        return false;
    };

    let mut removed = false;
    for button in buttons.iter_mut().filter_map(Value::as_object_mut) {
        if button.get(keys::ID).and_then(Value::as_str) == Some(id) {
            removed |= button.remove(field).is_some();
        }
    }
    removed
}

/// Scan the base for image payloads
fn detect_images(base: &Descriptor, defaults: &ProtectionDefaults) -> BTreeSet<FieldPath> {
    let is_image = |v: &Value| v.as_str().is_some_and(|s| defaults.is_image_payload(s));
    let mut paths = BTreeSet::new();

    if let Some(bg) = &base.app_background {
        for (key, value) in bg.props() {
            if is_image(value) {
                paths.insert(FieldPath::app_background(key.as_str()));
            }
        }
    }

    for (key, value) in base.theme.props() {
        if key.starts_with(THEME_BACKGROUND_PREFIX) && is_image(value) {
            paths.insert(FieldPath::theme(key.as_str()));
        }
    }

    for button in &base.layout.buttons {
        if button.prop(BUTTON_IMAGE_KEY).is_some_and(is_image) {
            paths.insert(FieldPath::button(button.id.as_str(), BUTTON_IMAGE_KEY));
        }
    }

    paths
}
