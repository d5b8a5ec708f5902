use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Quantile granularity used to bucket a numeric attribute.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::Division;
///
/// let d: Division = "qua".parse().unwrap();
/// assert_eq!(d, Division::Quartile);
/// assert_eq!(Division::Decile.cut_points().len(), 11);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Division {
    /// Four buckets: cut points 0, .25, .5, .75, 1.
    #[serde(alias = "qua")]
    Quartile,
    /// Ten buckets: cut points 0, .1, …, 1.
    #[serde(alias = "dec")]
    Decile,
    /// Attribute is used as-is (categorical or flag attributes).
    None,
}

const QUARTILE_CUTS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];
const DECILE_CUTS: [f64; 11] = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];

impl Division {
    /// Quantile fractions this division computes, ascending.
    ///
    /// Empty for [`Division::None`].
    pub fn cut_points(self) -> &'static [f64] {
        match self {
            Division::Quartile => &QUARTILE_CUTS,
            Division::Decile => &DECILE_CUTS,
            Division::None => &[],
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Division::Quartile => write!(f, "quartile"),
            Division::Decile => write!(f, "decile"),
            Division::None => write!(f, "none"),
        }
    }
}

impl FromStr for Division {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quartile" | "qua" => Ok(Division::Quartile),
            "decile" | "dec" => Ok(Division::Decile),
            "none" => Ok(Division::None),
            other => Err(format!("unknown division: {other}")),
        }
    }
}

/// Attribute name → division for one mining session.
///
/// Presence in the map is what makes an attribute part of the session; the
/// division says how numeric attributes are bucketed.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::{Division, QuantileConfig};
///
/// let config: QuantileConfig = [("pushes", Division::Quartile), ("language", Division::None)]
///     .into_iter()
///     .collect();
/// assert_eq!(config.get("pushes"), Some(Division::Quartile));
/// assert!(config.contains("language"));
/// assert!(!config.contains("forks"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuantileConfig(BTreeMap<String, Division>);

impl QuantileConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the division for `column`, replacing any previous value.
    pub fn insert(&mut self, column: impl Into<String>, division: Division) {
        self.0.insert(column.into(), division);
    }

    /// Division configured for `column`.
    pub fn get(&self, column: &str) -> Option<Division> {
        self.0.get(column).copied()
    }

    /// Whether `column` takes part in the session.
    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    /// Iterate `(column, division)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Division)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of configured attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no attribute is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Division)> for QuantileConfig {
    fn from_iter<I: IntoIterator<Item = (K, Division)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Language for user-facing labels and condition messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English.
    #[default]
    En,
    /// Russian.
    Ru,
}

impl Locale {
    /// Row label prefix for quartile tables.
    pub fn quartile_label(self) -> &'static str {
        match self {
            Locale::En => "Quartile",
            Locale::Ru => "Квартиль",
        }
    }

    /// Row label prefix for decile tables.
    pub fn decile_label(self) -> &'static str {
        match self {
            Locale::En => "Decile",
            Locale::Ru => "Дециль",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Ru => write!(f, "ru"),
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "ru" | "russian" => Ok(Locale::Ru),
            other => Err(format!("unknown locale: {other}")),
        }
    }
}

/// Machine-readable kind of a recoverable condition.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::{ConditionKind, Locale};
///
/// let json = serde_json::to_string(&ConditionKind::NoPatterns).unwrap();
/// assert_eq!(json, "\"noPatterns\"");
/// assert!(ConditionKind::EmptyTable.message(Locale::En).contains("No data"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionKind {
    /// Data acquisition yielded zero usable rows.
    EmptyTable,
    /// Fewer rows than the minimum viable sample.
    InsufficientRows,
    /// No itemset or rule survived the thresholds.
    NoPatterns,
}

impl ConditionKind {
    /// Fixed user-facing message for this condition.
    pub fn message(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (ConditionKind::EmptyTable, Locale::En) => {
                "No data received. Try changing the query parameters so that more repositories are included."
            }
            (ConditionKind::EmptyTable, Locale::Ru) => {
                "Данные не получены. Попробуйте изменить параметры запроса, чтобы в выборку попало больше репозиториев"
            }
            (ConditionKind::InsufficientRows, Locale::En) => {
                "Too few repository records were received. Try changing the query parameters."
            }
            (ConditionKind::InsufficientRows, Locale::Ru) => {
                "Получено слишком мало записей репозиториев. Попробуйте изменить параметры запроса"
            }
            (ConditionKind::NoPatterns, Locale::En) => {
                "No patterns found. Try changing the search parameters."
            }
            (ConditionKind::NoPatterns, Locale::Ru) => {
                "Шаблоны не найдены. Попробуйте изменить параметры поиска"
            }
        }
    }
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
