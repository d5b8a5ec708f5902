//! Item labeling and one-hot transaction encoding.

use gitpatterns_core::{Cell, Column, RepoTable, TransactionMatrix};
use tracing::debug;

/// Items that never take part in mining.
const DROPPED_ITEMS: [&str; 2] = ["None", "Other"];

/// Item token for one cell of `column`, before name normalization.
///
/// Returns `None` for cells that produce no item.
fn item_token(column: &Column, cell: Cell<'_>) -> Option<String> {
    let name = column.name.as_str();
    match cell {
        Cell::Null | Cell::Bool(false) => None,
        Cell::Bool(true) => Some(name.to_string()),
        Cell::Int(v) => Some(format!("{name} {v}")),
        // Debug keeps the trailing `.0` on whole floats.
        Cell::Float(v) => Some(format!("{name} {v:?}")),
        Cell::Rank(r) => Some(format!("{name} {r}")),
        Cell::Str("None") => Some("None".to_string()),
        Cell::Str(v) => Some(match name {
            "language" => format!("language_{v}"),
            "license_name" => format!("license_{}", v.replace("License", "").trim()),
            _ => v.to_string(),
        }),
    }
}

/// Normalize an item name for display: a single leading `_` is stripped and
/// every other `_` becomes a space.
///
/// # Examples
///
/// ```
/// use gitpatterns_convert::normalize_item_name;
///
/// assert_eq!(normalize_item_name("language_Go"), "language Go");
/// assert_eq!(normalize_item_name("_avg_push_size 2"), "avg push size 2");
/// ```
pub fn normalize_item_name(token: &str) -> String {
    token.strip_prefix('_').unwrap_or(token).replace('_', " ")
}

/// One-hot encode a ranked table into a transaction matrix.
///
/// Items are added in first-seen order, column by column. Tokens that
/// normalize to the same name share one item.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::{ColumnData, RepoTable};
/// use gitpatterns_convert::encode;
///
/// let table = RepoTable::new(vec!["a".into(), "b".into()])
///     .with_column("pushes", ColumnData::Rank(vec![Some(1), Some(2)]))
///     .unwrap()
///     .with_column("language", ColumnData::Str(vec![Some("Go".into()), Some("None".into())]))
///     .unwrap();
///
/// let matrix = encode(&table);
/// assert_eq!(matrix.items(), &["pushes 1", "pushes 2", "language Go"]);
/// assert_eq!(matrix.row_items(1), vec!["pushes 2"]);
/// ```
pub fn encode(table: &RepoTable) -> TransactionMatrix {
    let mut matrix = TransactionMatrix::new(table.row_count());
    for column in table.columns() {
        for (row, cell) in column.data.cells().enumerate() {
            let Some(token) = item_token(column, cell) else {
                continue;
            };
            let name = normalize_item_name(&token);
            if DROPPED_ITEMS.contains(&name.as_str()) {
                continue;
            }
            let item = matrix.insert_item(name);
            matrix.set(row, item);
        }
    }
    debug!(
        transactions = matrix.row_count(),
        items = matrix.item_count(),
        "encoded transactions"
    );
    matrix
}
