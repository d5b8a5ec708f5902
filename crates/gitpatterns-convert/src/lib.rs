//! Conversion of repository tables into mining transactions.
//!
//! The pipeline runs in four stages: [`clean`] removes duplicates and
//! useless attributes, [`compute_boundaries`] and [`assign_ranks`] bucket
//! numeric attributes into quantile ranks, [`encode`] one-hot encodes the
//! labeled values, and [`format_quantile_tables`] renders the boundaries
//! for display. [`convert_to_transactions`] runs them in order.

pub mod clean;
pub mod encode;
pub mod quantile;
pub mod view;

use gitpatterns_core::{AttributeCatalog, Locale, QuantileConfig, RepoTable, TransactionMatrix};
use serde::Serialize;
use tracing::info;

pub use clean::clean;
pub use encode::{encode, normalize_item_name};
pub use quantile::{assign_ranks, compute_boundaries, BoundaryTable, ColumnBoundaries};
pub use view::{format_quantile_tables, QuantileView, QuantileViewRow};

/// Everything the conversion pipeline produces for one session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    /// One-hot item matrix, one transaction per repository.
    #[serde(skip)]
    pub transactions: TransactionMatrix,
    /// Raw quantile boundaries.
    pub boundaries: BoundaryTable,
    /// Quartile ranges for display.
    pub quartiles: Option<QuantileView>,
    /// Decile ranges for display.
    pub deciles: Option<QuantileView>,
}

/// Convert a repository table into a transaction matrix.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::{AttributeCatalog, ColumnData, Division, Locale, QuantileConfig, RepoTable};
/// use gitpatterns_convert::convert_to_transactions;
///
/// let table = RepoTable::new((0..8).map(|i| format!("org/r{i}")).collect())
///     .with_column("pushes", ColumnData::Int((1..=8).map(Some).collect()))
///     .unwrap();
/// let config: QuantileConfig = [("pushes", Division::Quartile)].into_iter().collect();
/// let catalog = AttributeCatalog::builtin().unwrap();
///
/// let conversion = convert_to_transactions(&table, &config, &catalog, Locale::En);
/// assert_eq!(conversion.transactions.row_count(), 8);
/// assert_eq!(conversion.transactions.item_count(), 4);
/// assert!(conversion.quartiles.is_some());
/// ```
pub fn convert_to_transactions(
    table: &RepoTable,
    config: &QuantileConfig,
    catalog: &AttributeCatalog,
    locale: Locale,
) -> Conversion {
    let cleaned = clean(table, config, catalog);
    info!(
        rows = cleaned.row_count(),
        columns = cleaned.column_count(),
        dropped_rows = table.row_count() - cleaned.row_count(),
        dropped_columns = table.column_count() - cleaned.column_count(),
        "cleaned repository table"
    );

    let boundaries = compute_boundaries(&cleaned, config);
    let ranked = assign_ranks(&cleaned, &boundaries);
    info!(discretized = boundaries.len(), "assigned quantile ranks");

    let transactions = encode(&ranked);
    info!(
        transactions = transactions.row_count(),
        items = transactions.item_count(),
        "built transaction matrix"
    );

    let (quartiles, deciles) = format_quantile_tables(&boundaries, config, catalog, locale);
    Conversion {
        transactions,
        boundaries,
        quartiles,
        deciles,
    }
}
