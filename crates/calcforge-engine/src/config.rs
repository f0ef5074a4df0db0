//! Engine configuration
//!
//! [`EngineConfig`] is constructed once by the host and handed to
//! [`crate::Engine::new`]. It can be built in code with the `with_*` methods
//! or loaded from a TOML, YAML or JSON file.

use calcforge_descriptor::GridPosition;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bounds applied to freshly introduced buttons
    pub grid: GridBounds,
    /// Image auto-detection settings
    pub protection: ProtectionDefaults,
    /// Labels every finished calculator is expected to carry
    ///
    /// Missing ones are reported, never enforced. Empty disables the check.
    pub required_labels: Vec<String>,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With grid bounds
    #[inline]
    #[must_use]
    pub fn with_grid(mut self, grid: GridBounds) -> Self {
        self.grid = grid;
        self
    }

    /// With image payload prefixes used by auto-detection
    #[inline]
    #[must_use]
    pub fn with_image_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.protection.image_prefixes = prefixes;
        self
    }

    /// With the labels a complete keypad must contain
    #[inline]
    #[must_use]
    pub fn with_required_labels(mut self, labels: Vec<String>) -> Self {
        self.required_labels = labels;
        self
    }

    /// The standard keypad: digits, four operators, equals and clear-all
    #[must_use]
    pub fn standard_keypad_labels() -> Vec<String> {
        [
            "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "+", "-", "×", "÷", "=", "AC",
        ]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
    }

    /// Check internal consistency
    ///
    /// # Errors
    /// Returns error if a bound range is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.min_row > self.grid.max_row {
            return Err(ConfigError::Invalid(format!(
                "grid.min_row ({}) exceeds grid.max_row ({})",
                self.grid.min_row, self.grid.max_row
            )));
        }
        if self.grid.min_column > self.grid.max_column {
            return Err(ConfigError::Invalid(format!(
                "grid.min_column ({}) exceeds grid.max_column ({})",
                self.grid.min_column, self.grid.max_column
            )));
        }
        Ok(())
    }

    /// Parse from TOML
    ///
    /// # Errors
    /// Returns error if TOML is invalid or the result is inconsistent
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from YAML
    ///
    /// # Errors
    /// Returns error if YAML is invalid or the result is inconsistent
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from JSON
    ///
    /// # Errors
    /// Returns error if JSON is invalid or the result is inconsistent
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, picking the format by extension
    ///
    /// # Errors
    /// Returns error if the file cannot be read, the extension is unknown,
    /// or parsing fails
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("yaml" | "yml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}

/// Inclusive grid bounds for new buttons
///
/// Row 0 is the display, so keypad rows start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridBounds {
    pub min_row: u32,
    pub max_row: u32,
    pub min_column: u32,
    pub max_column: u32,
}

impl GridBounds {
    /// Check that a position lies inside the bounds
    #[inline]
    #[must_use]
    pub fn contains(&self, pos: &GridPosition) -> bool {
        (self.min_row..=self.max_row).contains(&pos.row)
            && (self.min_column..=self.max_column).contains(&pos.column)
    }
}

impl Default for GridBounds {
    fn default() -> Self {
        Self {
            min_row: 1,
            max_row: 12,
            min_column: 0,
            max_column: 9,
        }
    }
}

/// Settings for protected-path auto-detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectionDefaults {
    /// A string starting with any of these is treated as an embedded image
    pub image_prefixes: Vec<String>,
}

impl ProtectionDefaults {
    /// Check whether a string looks like an embedded image payload
    #[must_use]
    pub fn is_image_payload(&self, s: &str) -> bool {
        self.image_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && s.starts_with(prefix.as_str()))
    }
}

impl Default for ProtectionDefaults {
    fn default() -> Self {
        Self {
            image_prefixes: vec!["data:image/".to_string()],
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unknown file extension
    #[error("unsupported config format: '{0}' (expected toml, yaml, yml or json)")]
    UnsupportedFormat(String),

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Parsed but inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_bounds() {
        let bounds = GridBounds::default();
        assert!(bounds.contains(&GridPosition::new(1, 0)));
        assert!(bounds.contains(&GridPosition::new(12, 9)));
        assert!(!bounds.contains(&GridPosition::new(0, 0)));
        assert!(!bounds.contains(&GridPosition::new(13, 0)));
        assert!(!bounds.contains(&GridPosition::new(1, 10)));
    }

    #[test]
    fn toml_partial_override() {
        let config = EngineConfig::from_toml_str(
            r#"
            required_labels = ["0", "1"]

            [grid]
            max_column = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.grid.max_column, 5);
        assert_eq!(config.grid.max_row, 12);
        assert_eq!(config.required_labels, vec!["0", "1"]);
        assert_eq!(config.protection, ProtectionDefaults::default());
    }

    #[test]
    fn yaml_config() {
        let config = EngineConfig::from_yaml_str(
            "protection:\n  image_prefixes:\n    - \"data:image/\"\n    - \"blob:\"\n",
        )
        .unwrap();
        assert!(config.protection.is_image_payload("blob:abc"));
        assert!(!config.protection.is_image_payload("https://example.com/a.png"));
    }

    #[test]
    fn rejects_inverted_bounds() {
        let result = EngineConfig::from_toml_str("[grid]\nmin_row = 5\nmax_row = 2\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[grid]\nmax_row = 8").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.grid.max_row, 8);
    }

    #[test]
    fn load_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let result = EngineConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"));
    }

    #[test]
    fn load_missing_file() {
        let result = EngineConfig::load("/definitely/not/here.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
