//! Data cleaning ahead of discretization.
//!
//! Removes duplicate repository rows and drops attributes that cannot carry
//! a pattern: unknown to the catalog, outside the session, empty, made only
//! of `"None"`, or mostly zero.

use gitpatterns_core::{AttributeCatalog, Cell, Column, QuantileConfig, RepoTable};
use tracing::debug;

const MAX_ZERO_SHARE: f64 = 0.5;

/// Clean `table` for the attributes in `config`.
///
/// Row deduplication and column dropping repeat until neither changes the
/// table, so cleaning a cleaned table returns it unchanged.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::{AttributeCatalog, ColumnData, Division, QuantileConfig, RepoTable};
/// use gitpatterns_convert::clean;
///
/// let table = RepoTable::new(vec!["a".into(), "a".into(), "b".into()])
///     .with_column("forks", ColumnData::Int(vec![Some(3), Some(3), Some(5)]))
///     .unwrap()
///     .with_column("issues", ColumnData::Int(vec![Some(0), Some(0), Some(1)]))
///     .unwrap();
/// let config: QuantileConfig = [("forks", Division::Quartile), ("issues", Division::Quartile)]
///     .into_iter()
///     .collect();
/// let catalog = AttributeCatalog::builtin().unwrap();
///
/// let cleaned = clean(&table, &config, &catalog);
/// assert_eq!(cleaned.row_count(), 2);
/// // half of the deduplicated `issues` values are zero, which is not more than half
/// assert!(cleaned.column("issues").is_some());
/// ```
pub fn clean(table: &RepoTable, config: &QuantileConfig, catalog: &AttributeCatalog) -> RepoTable {
    let mut current = table.clone();
    loop {
        let rows = current.distinct_rows();
        let deduped = if rows.len() == current.row_count() {
            current.clone()
        } else {
            current.select_rows(&rows)
        };
        let kept = deduped.retain_columns(|c| keep_column(c, deduped.row_count(), config, catalog));

        if kept == current {
            break;
        }
        debug!(
            rows_before = current.row_count(),
            rows_after = kept.row_count(),
            columns_before = current.column_count(),
            columns_after = kept.column_count(),
            "cleaning pass"
        );
        current = kept;
    }
    current
}

fn keep_column(
    column: &Column,
    rows: usize,
    config: &QuantileConfig,
    catalog: &AttributeCatalog,
) -> bool {
    if !catalog.contains(&column.name) || !config.contains(&column.name) {
        return false;
    }
    // Only nulls and "None" markers left: nothing to encode.
    let informative = column
        .data
        .cells()
        .any(|cell| !cell.is_null() && cell != Cell::Str("None"));
    if !informative {
        return false;
    }
    // Nulls stay in the denominator but never count as zero.
    let zeros = column.data.cells().filter(Cell::is_zero).count();
    zeros as f64 / rows as f64 <= MAX_ZERO_SHARE
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitpatterns_core::{ColumnData, Division};

    fn config(columns: &[&str]) -> QuantileConfig {
        columns.iter().map(|&c| (c, Division::Quartile)).collect()
    }

    fn catalog() -> AttributeCatalog {
        AttributeCatalog::builtin().unwrap()
    }

    fn repos(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("org/repo{i}")).collect()
    }

    #[test]
    fn removes_exact_duplicates_keeping_first() {
        let table = RepoTable::new(vec!["b".into(), "a".into(), "b".into(), "a".into()])
            .with_column("forks", ColumnData::Int(vec![Some(1), Some(2), Some(1), Some(3)]))
            .unwrap();
        let cleaned = clean(&table, &config(&["forks"]), &catalog());
        assert_eq!(cleaned.repos(), &["b".to_string(), "a".to_string(), "a".to_string()]);
        assert_eq!(
            cleaned.column("forks").unwrap().data,
            ColumnData::Int(vec![Some(1), Some(2), Some(3)])
        );
    }

    #[test]
    fn drops_columns_outside_catalog_or_session() {
        let table = RepoTable::new(repos(2))
            .with_column("forks", ColumnData::Int(vec![Some(1), Some(2)]))
            .unwrap()
            .with_column("issues", ColumnData::Int(vec![Some(1), Some(2)]))
            .unwrap()
            .with_column("topic", ColumnData::Str(vec![Some("cli".into()), None]))
            .unwrap();
        let cleaned = clean(&table, &config(&["forks", "topic"]), &catalog());
        assert_eq!(cleaned.column_names().collect::<Vec<_>>(), vec!["forks"]);
    }

    #[test]
    fn drops_empty_and_none_only_columns() {
        let table = RepoTable::new(repos(3))
            .with_column("watches", ColumnData::Int(vec![None, None, None]))
            .unwrap()
            .with_column(
                "license_name",
                ColumnData::Str(vec![Some("None".into()), Some("None".into()), Some("None".into())]),
            )
            .unwrap()
            .with_column(
                "language",
                ColumnData::Str(vec![Some("Go".into()), Some("None".into()), None]),
            )
            .unwrap();
        let cleaned = clean(
            &table,
            &config(&["watches", "license_name", "language"]),
            &catalog(),
        );
        assert_eq!(cleaned.column_names().collect::<Vec<_>>(), vec!["language"]);
    }

    #[test]
    fn zero_share_threshold_is_strict() {
        // 2 of 4 zero: kept. 3 of 4 zero: dropped. Nulls are not zeros.
        let table = RepoTable::new(repos(4))
            .with_column("forks", ColumnData::Int(vec![Some(0), Some(0), Some(1), Some(2)]))
            .unwrap()
            .with_column("issues", ColumnData::Int(vec![Some(0), Some(0), Some(0), Some(2)]))
            .unwrap()
            .with_column(
                "avg_push_size",
                ColumnData::Float(vec![Some(0.0), Some(0.0), None, None]),
            )
            .unwrap();
        let cleaned = clean(
            &table,
            &config(&["forks", "issues", "avg_push_size"]),
            &catalog(),
        );
        assert_eq!(
            cleaned.column_names().collect::<Vec<_>>(),
            vec!["forks", "avg_push_size"]
        );
    }

    #[test]
    fn input_is_untouched_and_result_is_stable() {
        let table = RepoTable::new(vec!["a".into(), "a".into()])
            .with_column("forks", ColumnData::Int(vec![Some(1), Some(1)]))
            .unwrap()
            .with_column("topic", ColumnData::Str(vec![Some("x".into()), Some("y".into())]))
            .unwrap();
        let before = table.clone();
        let cleaned = clean(&table, &config(&["forks"]), &catalog());
        assert_eq!(table, before);
        // Dropping `topic` exposes a duplicate that the next pass removes.
        assert_eq!(cleaned.row_count(), 1);
        assert_eq!(clean(&cleaned, &config(&["forks"]), &catalog()), cleaned);
    }

    #[test]
    fn everything_dropped_is_valid() {
        let table = RepoTable::new(repos(2))
            .with_column("forks", ColumnData::Int(vec![Some(0), Some(0)]))
            .unwrap();
        let cleaned = clean(&table, &config(&["forks"]), &catalog());
        assert_eq!(cleaned.column_count(), 0);
        assert_eq!(cleaned.row_count(), 2);
    }
}
