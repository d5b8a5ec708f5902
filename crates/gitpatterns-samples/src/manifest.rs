//! Sample manifest parsing and validation.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use gitpatterns_core::{PatternsError, QuantileConfig};
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Description of one sample batch.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::Division;
/// use gitpatterns_samples::SampleManifest;
///
/// let manifest = SampleManifest::from_toml(r#"
/// data = "repos.csv"
/// start_date = "2024-01-01"
/// end_date = "2024-03-31"
///
/// [attributes]
/// pushes = "quartile"
/// language = "none"
/// "#).unwrap();
/// assert_eq!(manifest.attributes.get("pushes"), Some(Division::Quartile));
/// assert_eq!(manifest.min_watches, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleManifest {
    /// CSV file with the repository rows, relative to the manifest.
    pub data: PathBuf,
    /// First day of the event window (`YYYY-MM-DD`).
    pub start_date: String,
    /// Last day of the event window (`YYYY-MM-DD`).
    pub end_date: String,
    /// Free-form description.
    #[serde(default)]
    pub note: Option<String>,
    /// Minimum new stars a repository needed to be sampled (default: 10).
    #[serde(default = "default_min_watches")]
    pub min_watches: u32,
    /// Minimum members a repository needed to be sampled (default: 3).
    #[serde(default = "default_min_members")]
    pub min_members: u32,
    /// Whether only repositories created in the window were sampled.
    #[serde(default)]
    pub new_repos_only: bool,
    /// Attribute divisions the batch was collected with.
    #[serde(default)]
    pub attributes: QuantileConfig,
}

fn default_min_watches() -> u32 {
    10
}

fn default_min_members() -> u32 {
    3
}

impl SampleManifest {
    /// Load and validate a manifest, resolving `data` against its directory.
    ///
    /// # Errors
    ///
    /// Returns [`PatternsError::FileNotFound`] when the manifest is missing,
    /// [`PatternsError::Toml`] on malformed content, or any error of
    /// [`SampleManifest::validate`].
    pub fn from_file(path: &Path) -> Result<Self, PatternsError> {
        if !path.exists() {
            return Err(PatternsError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let mut manifest = Self::from_toml(&content)?;
        if manifest.data.is_relative() {
            if let Some(dir) = path.parent() {
                manifest.data = dir.join(&manifest.data);
            }
        }
        Ok(manifest)
    }

    /// Parse and validate a manifest from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PatternsError::Toml`] on malformed content, or any error of
    /// [`SampleManifest::validate`].
    pub fn from_toml(content: &str) -> Result<Self, PatternsError> {
        let manifest: Self = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check dates and attribute list.
    ///
    /// # Errors
    ///
    /// Returns [`PatternsError::InvalidParameter`] for unparseable dates or
    /// a start after the end, and [`PatternsError::Config`] when no
    /// attribute is listed.
    pub fn validate(&self) -> Result<(), PatternsError> {
        let (start, end) = self.date_range()?;
        if start > end {
            return Err(PatternsError::InvalidParameter(format!(
                "start_date {start} is after end_date {end}"
            )));
        }
        if self.attributes.is_empty() {
            return Err(PatternsError::Config(
                "sample manifest lists no attributes".into(),
            ));
        }
        Ok(())
    }

    /// Parsed `(start_date, end_date)`.
    ///
    /// # Errors
    ///
    /// Returns [`PatternsError::InvalidParameter`] if either date is not `YYYY-MM-DD`.
    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate), PatternsError> {
        Ok((
            parse_date("start_date", &self.start_date)?,
            parse_date("end_date", &self.end_date)?,
        ))
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, PatternsError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        PatternsError::InvalidParameter(format!("{field} '{value}' is not YYYY-MM-DD: {e}"))
    })
}
