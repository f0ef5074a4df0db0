//! Pipeline facade
//!
//! [`Engine::customize`] runs every stage in a fixed order:
//! normalize, strip protected writes, merge, sanitize, ensure companions,
//! reassert protected leaves.

use crate::companion::ensure_companions;
use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{EngineError, EngineResult};
use crate::merge::merge;
use crate::normalize::normalize;
use crate::protect::{ProtectionSet, ProtectionSpec};
use crate::sanitize::Sanitizer;
use calcforge_descriptor::Descriptor;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// One customization request
#[derive(Debug, Clone, PartialEq)]
pub struct CustomizeRequest {
    /// Descriptor the user currently has, if any
    pub base: Option<Descriptor>,
    /// Decoded model output; must be a JSON object
    pub patch: Value,
    /// Which leaves must survive unchanged
    pub protection: ProtectionSpec,
    /// Time the request was made; seeds generated ids and timestamps
    pub requested_at: DateTime<Utc>,
    /// Prompt that produced the patch
    pub author_prompt: Option<String>,
}

impl CustomizeRequest {
    /// Create a request stamped with the current time and auto-detected
    /// protection
    #[must_use]
    pub fn new(base: Option<Descriptor>, patch: Value) -> Self {
        Self {
            base,
            patch,
            protection: ProtectionSpec::default(),
            requested_at: Utc::now(),
            author_prompt: None,
        }
    }

    /// With a protection spec
    #[inline]
    #[must_use]
    pub fn with_protection(mut self, protection: ProtectionSpec) -> Self {
        self.protection = protection;
        self
    }

    /// With an explicit request time
    #[inline]
    #[must_use]
    pub fn requested_at(mut self, at: DateTime<Utc>) -> Self {
        self.requested_at = at;
        self
    }

    /// With the prompt that produced the patch
    #[inline]
    #[must_use]
    pub fn with_author_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.author_prompt = Some(prompt.into());
        self
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    /// The corrected descriptor
    pub descriptor: Descriptor,
    /// Everything dropped, repaired, stripped or inserted, in stage order
    pub diagnostics: Vec<Diagnostic>,
    /// Whether the result differs from the base (always true without one)
    pub changed: bool,
}

/// The configuration inheritance and validation engine
///
/// Stateless between calls; one instance can serve any number of requests.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create an engine
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Merge the request's patch into its base and validate the result
    ///
    /// # Errors
    /// Returns [`EngineError::MalformedPatch`] if the patch is not an object,
    /// [`EngineError::InvalidProtectedPath`] if an explicit protected path is
    /// not a known template
    pub fn customize(&self, request: &CustomizeRequest) -> EngineResult<Outcome> {
        let Value::Object(patch) = &request.patch else {
            return Err(EngineError::malformed_patch(&request.patch));
        };
        let base = request.base.as_ref();
        tracing::info!(
            "Customizing {} with {} patch keys",
            base.map_or("new descriptor", |b| b.id.as_str()),
            patch.len()
        );

        let protection =
            ProtectionSet::resolve(base, &request.protection, &self.config.protection)?;
        tracing::debug!("Resolved {} protected paths", protection.len());

        let mut diagnostics = Diagnostics::new();
        let patch = normalize(patch.clone(), &mut diagnostics);
        let patch = protection.strip(patch, &mut diagnostics);

        let base_value = base.map(Descriptor::to_value).transpose()?;
        let merged = merge(base_value.as_ref(), &patch);

        let sanitized = Sanitizer::new(&self.config, base, request.requested_at)
            .with_author_prompt(request.author_prompt.as_deref())
            .sanitize(merged, &mut diagnostics);

        let mut descriptor =
            ensure_companions(sanitized.descriptor, &sanitized.rejected_ids, &mut diagnostics);
        protection.reassert(&mut descriptor, base);

        let changed = match base {
            Some(base) => base.fingerprint()? != descriptor.fingerprint()?,
            None => true,
        };

        tracing::info!(
            "Customized {}: {} buttons, {} diagnostics, changed={}",
            descriptor.id,
            descriptor.layout.buttons.len(),
            diagnostics.len(),
            changed
        );

        Ok(Outcome {
            descriptor,
            diagnostics: diagnostics.into_vec(),
            changed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn rejects_non_object_patch() {
        let engine = Engine::default();
        let err = engine
            .customize(&CustomizeRequest::new(None, json!("make it red")))
            .unwrap_err();
        assert!(matches!(err, EngineError::MalformedPatch { found: "string" }));
    }

    #[test]
    fn rejects_unknown_protected_path() {
        let engine = Engine::default();
        let request = CustomizeRequest::new(None, json!({}))
            .with_protection(ProtectionSpec::explicit(["layout.rows"]));
        assert!(matches!(
            engine.customize(&request),
            Err(EngineError::InvalidProtectedPath(_))
        ));
    }

    #[test]
    fn empty_patch_on_base_is_unchanged() {
        let engine = Engine::default();
        let first = engine
            .customize(&CustomizeRequest::new(None, json!({"name": "Calm"})).requested_at(at()))
            .unwrap();
        assert!(first.changed);

        let second = engine
            .customize(&CustomizeRequest::new(Some(first.descriptor.clone()), json!({})))
            .unwrap();
        assert!(!second.changed);
        assert_eq!(second.descriptor, first.descriptor);
    }

    #[test]
    fn request_builders() {
        let request = CustomizeRequest::new(None, json!({}))
            .requested_at(at())
            .with_author_prompt("dark mode")
            .with_protection(ProtectionSpec::none());
        assert_eq!(request.requested_at, at());
        assert_eq!(request.author_prompt.as_deref(), Some("dark mode"));
        assert!(!request.protection.auto_detect);
    }
}
