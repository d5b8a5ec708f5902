//! User-facing quantile tables.
//!
//! Each attribute becomes a column of value ranges, highest bucket first.
//! Every surviving boundary opens one row reaching down to the next lower
//! boundary, so the last row of a column is the closing interval at its
//! minimum (`"min - min"`, or `"0"` when the minimum is zero).

use std::fmt;

use gitpatterns_core::{AttributeCatalog, Division, Dtype, Locale, QuantileConfig};
use serde::{Deserialize, Serialize};

use crate::quantile::{BoundaryTable, ColumnBoundaries};

const MISSING_CELL: &str = "-";

/// One row of a [`QuantileView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantileViewRow {
    /// Row label such as `"Quartile 1"`.
    pub label: String,
    /// One range per column, `"-"` where the column has fewer buckets.
    pub cells: Vec<String>,
}

/// Boundary ranges of all attributes sharing one division.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantileView {
    /// Division shown by this view.
    pub division: Division,
    /// Column headers: attribute names with `_` replaced by spaces.
    pub headers: Vec<String>,
    /// Ranges, highest bucket first.
    pub rows: Vec<QuantileViewRow>,
}

impl QuantileView {
    /// Render as a GitHub-flavored Markdown table.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("| | {} |\n", self.headers.join(" | ")));
        out.push_str(&format!("|---|{}\n", "---|".repeat(self.headers.len())));
        for row in &self.rows {
            out.push_str(&format!("| {} | {} |\n", row.label, row.cells.join(" | ")));
        }
        out
    }
}

impl fmt::Display for QuantileView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_width = self
            .rows
            .iter()
            .map(|r| r.label.chars().count())
            .max()
            .unwrap_or(0);
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .filter_map(|r| r.cells.get(i))
                    .map(|c| c.chars().count())
                    .chain([h.chars().count()])
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:label_width$}", "")?;
        for (header, width) in self.headers.iter().zip(&widths) {
            write!(f, "  {header:>width$}")?;
        }
        writeln!(f)?;
        for row in &self.rows {
            write!(f, "{:<label_width$}", row.label)?;
            for (cell, width) in row.cells.iter().zip(&widths) {
                write!(f, "  {cell:>width$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn format_boundary(value: f64, integral: bool) -> String {
    if integral {
        format!("{}", value as i64)
    } else {
        let rounded = (value * 100.0).round() / 100.0;
        if rounded.fract() == 0.0 {
            format!("{rounded:.1}")
        } else {
            format!("{rounded}")
        }
    }
}

fn format_column(boundaries: &ColumnBoundaries, integral: bool) -> Vec<String> {
    let values = boundaries.descending();
    values
        .iter()
        .enumerate()
        .map(|(i, &upper)| {
            if upper == 0.0 {
                return "0".to_string();
            }
            let lower = values.get(i + 1).copied().unwrap_or(upper);
            format!(
                "{} - {}",
                format_boundary(lower, integral),
                format_boundary(upper, integral)
            )
        })
        .collect()
}

fn build_view(
    division: Division,
    columns: &[&ColumnBoundaries],
    catalog: &AttributeCatalog,
    locale: Locale,
) -> Option<QuantileView> {
    if columns.is_empty() {
        return None;
    }
    let rendered: Vec<Vec<String>> = columns
        .iter()
        .map(|b| {
            let integral = catalog
                .get(&b.name)
                .map(|spec| spec.dtype == Dtype::Int)
                .unwrap_or_else(|| b.values.iter().flatten().all(|v| v.fract() == 0.0));
            format_column(b, integral)
        })
        .collect();

    let label = match division {
        Division::Decile => locale.decile_label(),
        _ => locale.quartile_label(),
    };
    let height = rendered.iter().map(Vec::len).max().unwrap_or(0);
    let rows = (0..height)
        .map(|i| QuantileViewRow {
            label: format!("{label} {}", i + 1),
            cells: rendered
                .iter()
                .map(|col| col.get(i).cloned().unwrap_or_else(|| MISSING_CELL.to_string()))
                .collect(),
        })
        .collect();

    Some(QuantileView {
        division,
        headers: columns.iter().map(|b| b.name.replace('_', " ")).collect(),
        rows,
    })
}

/// Render quartile and decile boundaries for display.
///
/// Returns `(quartiles, deciles)`; a division without attributes is `None`.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::{AttributeCatalog, Division, Locale, QuantileConfig};
/// use gitpatterns_convert::{format_quantile_tables, BoundaryTable, ColumnBoundaries};
///
/// let boundaries = BoundaryTable {
///     columns: vec![ColumnBoundaries {
///         name: "pushes".into(),
///         division: Division::Quartile,
///         values: vec![Some(0.0), Some(2.0), Some(5.0), Some(9.0), Some(40.0)],
///     }],
/// };
/// let config: QuantileConfig = [("pushes", Division::Quartile)].into_iter().collect();
/// let catalog = AttributeCatalog::builtin().unwrap();
///
/// let (quartiles, deciles) = format_quantile_tables(&boundaries, &config, &catalog, Locale::En);
/// let quartiles = quartiles.unwrap();
/// assert!(deciles.is_none());
/// assert_eq!(quartiles.rows[0].label, "Quartile 1");
/// assert_eq!(quartiles.rows[0].cells, vec!["9 - 40"]);
/// assert_eq!(quartiles.rows[3].cells, vec!["0 - 2"]);
/// assert_eq!(quartiles.rows[4].cells, vec!["0"]);
/// ```
pub fn format_quantile_tables(
    boundaries: &BoundaryTable,
    config: &QuantileConfig,
    catalog: &AttributeCatalog,
    locale: Locale,
) -> (Option<QuantileView>, Option<QuantileView>) {
    let partition = |division: Division| {
        boundaries
            .with_division(division)
            .filter(|b| config.get(&b.name) == Some(division))
            .collect::<Vec<_>>()
    };
    (
        build_view(Division::Quartile, &partition(Division::Quartile), catalog, locale),
        build_view(Division::Decile, &partition(Division::Decile), catalog, locale),
    )
}
