use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PatternsError;
use crate::table::ColumnData;

const BUILTIN_CATALOG: &str = include_str!("../data/attributes.json");

/// Declared value type of an attribute.
///
/// Each variant maps to exactly one cell parser (see [`AttributeSpec::convert`]).
/// Unknown type names fail when the catalog is deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    /// Signed integer counts.
    Int,
    /// Ratios and averages, rounded to the entry's decimal places.
    Float,
    /// Categorical text.
    Str,
    /// Presence flags.
    Bool,
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dtype::Int => write!(f, "int"),
            Dtype::Float => write!(f, "float"),
            Dtype::Str => write!(f, "str"),
            Dtype::Bool => write!(f, "bool"),
        }
    }
}

/// Where the acquisition layer fetches an attribute from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DataSource {
    /// Aggregated from the public GitHub events dataset.
    ClickhouseQuery,
    /// Looked up per repository through the GitHub REST API.
    GithubApi,
}

/// One row of the attribute configuration table.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::{AttributeCatalog, Dtype};
///
/// let catalog = AttributeCatalog::builtin().unwrap();
/// let pushes = catalog.get("pushes").unwrap();
/// assert_eq!(pushes.dtype, Dtype::Int);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSpec {
    /// Canonical column name, unique within the catalog.
    pub column_name: String,
    /// User-facing label.
    pub decode_name: String,
    /// Short label for table headers.
    pub short_decode_name: String,
    /// Value type.
    pub dtype: Dtype,
    /// Rounding applied to float values on load.
    #[serde(default)]
    pub decimal_places: u32,
    /// Acquisition source.
    pub source: DataSource,
    /// Name of the aggregation query that produces the column, if any.
    #[serde(default)]
    pub join_query: Option<String>,
}

impl AttributeSpec {
    /// Convert raw text cells into a typed column.
    ///
    /// Empty cells and the tokens `null`, `NaN` and `None` become nulls for
    /// numeric and boolean attributes. Text attributes keep the literal
    /// `"None"` so the cleaner can recognise columns made only of it.
    ///
    /// # Errors
    ///
    /// Returns [`PatternsError::Csv`] naming the column and row of the first
    /// cell that does not parse as the declared type.
    ///
    /// # Examples
    ///
    /// ```
    /// use gitpatterns_core::{AttributeCatalog, ColumnData};
    ///
    /// let catalog = AttributeCatalog::builtin().unwrap();
    /// let ratio = catalog.get("closed_issues_ratio").unwrap();
    /// let column = ratio.convert(["0.333", "", "1"]).unwrap();
    /// assert_eq!(column, ColumnData::Float(vec![Some(0.33), None, Some(1.0)]));
    /// ```
    pub fn convert<'a, I>(&self, raw: I) -> Result<ColumnData, PatternsError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let cells = raw.into_iter().enumerate();
        let column = match self.dtype {
            Dtype::Int => ColumnData::Int(self.parse_all(cells, parse_int)?),
            Dtype::Float => {
                let scale = 10f64.powi(self.decimal_places as i32);
                let values = self.parse_all(cells, parse_float)?;
                ColumnData::Float(
                    values
                        .into_iter()
                        .map(|v| v.map(|x| (x * scale).round() / scale))
                        .collect(),
                )
            }
            Dtype::Str => ColumnData::Str(self.parse_all(cells, parse_str)?),
            Dtype::Bool => ColumnData::Bool(self.parse_all(cells, parse_bool)?),
        };
        Ok(column)
    }

    fn parse_all<'a, T>(
        &self,
        cells: impl Iterator<Item = (usize, &'a str)>,
        parse: fn(&str) -> Result<Option<T>, String>,
    ) -> Result<Vec<Option<T>>, PatternsError> {
        cells
            .map(|(row, raw)| {
                parse(raw.trim()).map_err(|e| {
                    PatternsError::Csv(format!(
                        "column '{}', row {}: {e}",
                        self.column_name,
                        row + 1
                    ))
                })
            })
            .collect()
    }
}

fn is_null_token(raw: &str) -> bool {
    raw.is_empty() || matches!(raw, "null" | "NULL" | "NaN" | "nan" | "None")
}

fn parse_int(raw: &str) -> Result<Option<i64>, String> {
    if is_null_token(raw) {
        return Ok(None);
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(Some(v));
    }
    // Exports of nullable integer columns often carry a trailing ".0".
    match raw.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v.is_finite() => Ok(Some(v as i64)),
        _ => Err(format!("expected an integer, got '{raw}'")),
    }
}

fn parse_float(raw: &str) -> Result<Option<f64>, String> {
    if is_null_token(raw) {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| format!("expected a number, got '{raw}'"))
}

fn parse_str(raw: &str) -> Result<Option<String>, String> {
    if raw.is_empty() {
        Ok(None)
    } else {
        Ok(Some(raw.to_string()))
    }
}

fn parse_bool(raw: &str) -> Result<Option<bool>, String> {
    if is_null_token(raw) {
        return Ok(None);
    }
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "t" => Ok(Some(true)),
        "false" | "0" | "no" | "f" => Ok(Some(false)),
        _ => Err(format!("expected a boolean, got '{raw}'")),
    }
}

/// The attribute configuration table, keyed by column name.
///
/// Loaded once at startup and passed by reference into every pipeline stage.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::{AttributeCatalog, DataSource};
///
/// let catalog = AttributeCatalog::builtin().unwrap();
/// assert_eq!(catalog.len(), 12);
/// assert!(catalog.contains("language"));
/// assert_eq!(catalog.by_source(DataSource::GithubApi).count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct AttributeCatalog {
    entries: Vec<AttributeSpec>,
    index: HashMap<String, usize>,
}

impl AttributeCatalog {
    /// The catalog shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns [`PatternsError::Serialization`] if the embedded table is malformed.
    pub fn builtin() -> Result<Self, PatternsError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Load a catalog from a JSON file holding an array of entries.
    ///
    /// # Errors
    ///
    /// Returns [`PatternsError::FileNotFound`] if `path` does not exist, or
    /// any error of [`AttributeCatalog::from_json`].
    pub fn from_file(path: &Path) -> Result<Self, PatternsError> {
        if !path.exists() {
            return Err(PatternsError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a catalog from a JSON array of entries.
    ///
    /// # Errors
    ///
    /// Returns [`PatternsError::Serialization`] on malformed JSON or unknown
    /// `dtype`/`source` values, and [`PatternsError::Config`] on duplicate
    /// column names.
    pub fn from_json(content: &str) -> Result<Self, PatternsError> {
        let entries: Vec<AttributeSpec> = serde_json::from_str(content)?;
        Self::from_entries(entries)
    }

    /// Build a catalog from already-parsed entries.
    ///
    /// # Errors
    ///
    /// Returns [`PatternsError::Config`] if two entries share a column name
    /// or a column name is empty.
    pub fn from_entries(entries: Vec<AttributeSpec>) -> Result<Self, PatternsError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if entry.column_name.trim().is_empty() {
                return Err(PatternsError::Config(format!(
                    "attribute entry {} has an empty column name",
                    i + 1
                )));
            }
            if index.insert(entry.column_name.clone(), i).is_some() {
                return Err(PatternsError::Config(format!(
                    "duplicate attribute '{}'",
                    entry.column_name
                )));
            }
        }
        Ok(Self { entries, index })
    }

    /// Entry for `column`, if configured.
    pub fn get(&self, column: &str) -> Option<&AttributeSpec> {
        self.index.get(column).map(|&i| &self.entries[i])
    }

    /// Whether `column` is configured.
    pub fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Entries fetched from `source`, in catalog order.
    pub fn by_source(&self, source: DataSource) -> impl Iterator<Item = &AttributeSpec> {
        self.entries.iter().filter(move |e| e.source == source)
    }

    /// All entries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
