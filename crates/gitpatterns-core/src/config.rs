use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::attributes::AttributeCatalog;
use crate::error::PatternsError;
use crate::types::Locale;

/// Top-level configuration loaded from `.gitpatterns.toml`.
///
/// Supports layered resolution: CLI flags > local config > defaults.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::PatternsConfig;
///
/// let config = PatternsConfig::default();
/// assert_eq!(config.samples.min_rows, 200);
/// assert_eq!(config.mining.max_antecedents, 3);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternsConfig {
    /// Default mining thresholds.
    #[serde(default)]
    pub mining: MiningParams,
    /// Sample loading settings.
    #[serde(default)]
    pub samples: SampleConfig,
    /// Attribute catalog settings.
    #[serde(default)]
    pub attributes: AttributesConfig,
    /// Language of labels and condition messages.
    #[serde(default)]
    pub locale: Locale,
}

impl PatternsConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PatternsError::Io`] if the file cannot be read, or
    /// [`PatternsError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gitpatterns_core::PatternsConfig;
    /// use std::path::Path;
    ///
    /// let config = PatternsConfig::from_file(Path::new(".gitpatterns.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, PatternsError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        // Catalog paths are relative to the config file, not the working directory.
        if let (Some(catalog), Some(dir)) = (config.attributes.catalog.as_mut(), path.parent()) {
            if catalog.is_relative() {
                *catalog = dir.join(&*catalog);
            }
        }
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PatternsError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use gitpatterns_core::PatternsConfig;
    ///
    /// let toml = r#"
    /// [mining]
    /// min_support = 0.2
    /// "#;
    /// let config = PatternsConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.mining.min_support, 0.2);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, PatternsError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load the attribute catalog this configuration points at.
    ///
    /// Falls back to the built-in catalog when no path is configured.
    ///
    /// # Errors
    ///
    /// Returns any error of [`AttributeCatalog::from_file`].
    pub fn load_catalog(&self) -> Result<AttributeCatalog, PatternsError> {
        match &self.attributes.catalog {
            Some(path) => AttributeCatalog::from_file(path),
            None => AttributeCatalog::builtin(),
        }
    }
}

/// Thresholds and size bounds for pattern mining.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::MiningParams;
///
/// let params = MiningParams::default();
/// assert_eq!(params.min_support, 0.1);
/// assert!(params.validate().is_ok());
///
/// let bad = MiningParams { min_support: 0.0, ..MiningParams::default() };
/// assert!(bad.validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningParams {
    /// Minimum itemset support, in `(0, 1]` (default: 0.1).
    #[serde(default = "default_min_support")]
    pub min_support: f64,
    /// Minimum rule confidence; 0 disables the filter (default: 0.5).
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Minimum rule lift (default: 1.0).
    #[serde(default = "default_min_lift")]
    pub min_lift: f64,
    /// Fewest items on the left-hand side (default: 1).
    #[serde(default = "default_min_side")]
    pub min_antecedents: usize,
    /// Fewest items on the right-hand side (default: 1).
    #[serde(default = "default_min_side")]
    pub min_consequents: usize,
    /// Most items on the left-hand side (default: 3).
    #[serde(default = "default_max_side")]
    pub max_antecedents: usize,
    /// Most items on the right-hand side (default: 3).
    #[serde(default = "default_max_side")]
    pub max_consequents: usize,
}

fn default_min_support() -> f64 {
    0.1
}

fn default_min_confidence() -> f64 {
    0.5
}

fn default_min_lift() -> f64 {
    1.0
}

fn default_min_side() -> usize {
    1
}

fn default_max_side() -> usize {
    3
}

impl Default for MiningParams {
    fn default() -> Self {
        Self {
            min_support: default_min_support(),
            min_confidence: default_min_confidence(),
            min_lift: default_min_lift(),
            min_antecedents: default_min_side(),
            min_consequents: default_min_side(),
            max_antecedents: default_max_side(),
            max_consequents: default_max_side(),
        }
    }
}

impl MiningParams {
    /// Check that every threshold is in range.
    ///
    /// # Errors
    ///
    /// Returns [`PatternsError::InvalidParameter`] describing the first bad value.
    pub fn validate(&self) -> Result<(), PatternsError> {
        let invalid = |msg: String| -> Result<(), PatternsError> {
            Err(PatternsError::InvalidParameter(msg))
        };
        if !(self.min_support > 0.0 && self.min_support <= 1.0) {
            return invalid(format!(
                "min_support must be in (0, 1], got {}",
                self.min_support
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return invalid(format!(
                "min_confidence must be in [0, 1], got {}",
                self.min_confidence
            ));
        }
        if !self.min_lift.is_finite() || self.min_lift < 0.0 {
            return invalid(format!("min_lift must be >= 0, got {}", self.min_lift));
        }
        if self.min_antecedents == 0 || self.min_consequents == 0 {
            return invalid("antecedent and consequent minimums must be at least 1".into());
        }
        if self.min_antecedents > self.max_antecedents {
            return invalid(format!(
                "min_antecedents ({}) exceeds max_antecedents ({})",
                self.min_antecedents, self.max_antecedents
            ));
        }
        if self.min_consequents > self.max_consequents {
            return invalid(format!(
                "min_consequents ({}) exceeds max_consequents ({})",
                self.min_consequents, self.max_consequents
            ));
        }
        Ok(())
    }
}

/// Sample loading settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Fewest repositories a sample must hold (default: 200).
    #[serde(default = "default_min_rows")]
    pub min_rows: usize,
}

fn default_min_rows() -> usize {
    200
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            min_rows: default_min_rows(),
        }
    }
}

/// Attribute catalog settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributesConfig {
    /// JSON catalog replacing the built-in one.
    pub catalog: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = PatternsConfig::default();
        assert_eq!(config.mining.min_support, 0.1);
        assert_eq!(config.mining.min_confidence, 0.5);
        assert_eq!(config.mining.min_lift, 1.0);
        assert_eq!(config.mining.min_antecedents, 1);
        assert_eq!(config.mining.min_consequents, 1);
        assert_eq!(config.mining.max_antecedents, 3);
        assert_eq!(config.mining.max_consequents, 3);
        assert_eq!(config.samples.min_rows, 200);
        assert!(config.attributes.catalog.is_none());
        assert_eq!(config.locale, Locale::En);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
locale = "ru"

[mining]
min_support = 0.05
min_confidence = 0.7
min_lift = 1.2
max_antecedents = 2

[samples]
min_rows = 50

[attributes]
catalog = "/etc/gitpatterns/attributes.json"
"#;
        let config = PatternsConfig::from_toml(toml).unwrap();
        assert_eq!(config.locale, Locale::Ru);
        assert_eq!(config.mining.min_support, 0.05);
        assert_eq!(config.mining.min_confidence, 0.7);
        assert_eq!(config.mining.max_antecedents, 2);
        assert_eq!(config.mining.max_consequents, 3);
        assert_eq!(config.samples.min_rows, 50);
        assert_eq!(
            config.attributes.catalog.as_deref(),
            Some(Path::new("/etc/gitpatterns/attributes.json"))
        );
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PatternsConfig::from_toml("").unwrap();
        assert_eq!(config.samples.min_rows, 200);
        assert_eq!(config.mining, MiningParams::default());
    }

    #[test]
    fn invalid_toml_returns_error() {
        assert!(PatternsConfig::from_toml("{{invalid}}").is_err());
    }

    #[test]
    fn relative_catalog_resolves_against_config_dir() {
        let dir = std::env::temp_dir().join(format!("gitpatterns-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(".gitpatterns.toml");
        std::fs::write(&path, "[attributes]\ncatalog = \"attrs.json\"\n").unwrap();

        let config = PatternsConfig::from_file(&path).unwrap();
        assert_eq!(config.attributes.catalog, Some(dir.join("attrs.json")));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn builtin_catalog_when_unconfigured() {
        let catalog = PatternsConfig::default().load_catalog().unwrap();
        assert!(catalog.contains("pushes"));
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let base = MiningParams::default();
        let cases = [
            MiningParams { min_support: 1.5, ..base.clone() },
            MiningParams { min_confidence: -0.1, ..base.clone() },
            MiningParams { min_lift: f64::NAN, ..base.clone() },
            MiningParams { min_antecedents: 0, ..base.clone() },
            MiningParams { min_antecedents: 4, ..base.clone() },
            MiningParams { min_consequents: 2, max_consequents: 1, ..base.clone() },
        ];
        for params in cases {
            assert!(
                matches!(params.validate(), Err(PatternsError::InvalidParameter(_))),
                "{params:?} should be rejected"
            );
        }
        assert!(base.validate().is_ok());
    }
}
