use std::path::PathBuf;

use crate::types::{ConditionKind, Locale};

/// Errors that can occur across gitpatterns.
///
/// Three variants are recoverable *conditions* rather than faults:
/// [`EmptyTable`](Self::EmptyTable), [`InsufficientRows`](Self::InsufficientRows)
/// and [`NoPatterns`](Self::NoPatterns). They are reported by
/// [`condition`](Self::condition) and can be rendered for the user with
/// [`localized`](Self::localized). Library crates use this type directly; the
/// binary crate converts to `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::{ConditionKind, PatternsError};
///
/// let err = PatternsError::NoPatterns("no frequent itemsets".into());
/// assert_eq!(err.condition(), Some(ConditionKind::NoPatterns));
/// assert!(err.to_string().contains("no frequent itemsets"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum PatternsError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A mining or loading parameter is out of range.
    #[error("invalid parameter: {0}")]
    #[diagnostic(help("adjust the parameter and run again"))]
    InvalidParameter(String),

    /// Samples with different attribute divisions were merged.
    #[error("sample attribute settings do not match: {0}")]
    #[diagnostic(help("only samples collected with identical attribute divisions can be mined together"))]
    ConfigMismatch(String),

    /// The data source produced no usable rows.
    #[error("no data: {0}")]
    EmptyTable(String),

    /// The data source produced fewer rows than mining needs.
    #[error("only {rows} repositories in sample, at least {min} required")]
    InsufficientRows {
        /// Rows actually present.
        rows: usize,
        /// Required minimum.
        min: usize,
    },

    /// Mining finished but nothing survived the thresholds.
    #[error("no patterns found: {0}")]
    #[diagnostic(help("lower min-support, min-confidence or min-lift, or widen the size bounds"))]
    NoPatterns(String),

    /// CSV reading failure.
    #[error("CSV error: {0}")]
    Csv(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

impl PatternsError {
    /// The recoverable condition this error represents, if any.
    pub fn condition(&self) -> Option<ConditionKind> {
        match self {
            PatternsError::EmptyTable(_) => Some(ConditionKind::EmptyTable),
            PatternsError::InsufficientRows { .. } => Some(ConditionKind::InsufficientRows),
            PatternsError::NoPatterns(_) => Some(ConditionKind::NoPatterns),
            _ => None,
        }
    }

    /// User-facing message in `locale`.
    ///
    /// Conditions get the fixed, translated message of their kind; every
    /// other error falls back to its `Display` text.
    ///
    /// # Examples
    ///
    /// ```
    /// use gitpatterns_core::{Locale, PatternsError};
    ///
    /// let err = PatternsError::InsufficientRows { rows: 12, min: 200 };
    /// assert!(err.localized(Locale::En).contains("200"));
    /// assert!(err.localized(Locale::Ru).contains("200"));
    /// ```
    pub fn localized(&self, locale: Locale) -> String {
        match self {
            PatternsError::InsufficientRows { min, .. } => match locale {
                Locale::En => format!(
                    "Fewer than {min} repository records were received. Try changing the query parameters."
                ),
                Locale::Ru => format!(
                    "Получено меньше {min} записей репозиториев. Попробуйте изменить параметры запроса"
                ),
            },
            PatternsError::ConfigMismatch(_) => match locale {
                Locale::En => "Sample attribute settings do not match.".into(),
                Locale::Ru => "Параметры атрибутов данных не совпадают".into(),
            },
            other => match other.condition() {
                Some(kind) => kind.message(locale).to_string(),
                None => other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PatternsError = io_err.into();
        assert!(err.to_string().contains("gone"));
        assert_eq!(err.condition(), None);
    }

    #[test]
    fn config_error_displays_message() {
        let err = PatternsError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = PatternsError::FileNotFound(PathBuf::from("/tmp/missing.csv"));
        assert!(err.to_string().contains("/tmp/missing.csv"));
    }

    #[test]
    fn conditions_are_classified() {
        assert_eq!(
            PatternsError::EmptyTable("x".into()).condition(),
            Some(ConditionKind::EmptyTable)
        );
        assert_eq!(
            PatternsError::InsufficientRows { rows: 1, min: 200 }.condition(),
            Some(ConditionKind::InsufficientRows)
        );
        assert_eq!(
            PatternsError::NoPatterns("x".into()).condition(),
            Some(ConditionKind::NoPatterns)
        );
        assert_eq!(PatternsError::ConfigMismatch("x".into()).condition(), None);
        assert_eq!(PatternsError::InvalidParameter("x".into()).condition(), None);
    }

    #[test]
    fn localized_no_patterns_message() {
        let err = PatternsError::NoPatterns("stage".into());
        assert_eq!(
            err.localized(Locale::Ru),
            "Шаблоны не найдены. Попробуйте изменить параметры поиска"
        );
        assert!(err.localized(Locale::En).starts_with("No patterns found"));
    }

    #[test]
    fn non_condition_localizes_to_display() {
        let err = PatternsError::Csv("line 3".into());
        assert_eq!(err.localized(Locale::Ru), "CSV error: line 3");
    }
}
