//! Quantile boundaries and rank assignment.
//!
//! Boundaries are computed per numeric attribute with linear interpolation
//! between order statistics. Repeated boundaries are suppressed so every
//! remaining cut is unique, then values are replaced by their bucket rank
//! with rank 1 as the top bucket.

use std::collections::HashSet;

use gitpatterns_core::{ColumnData, Division, QuantileConfig, RepoTable};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Boundaries of one attribute, aligned with [`Division::cut_points`].
///
/// Suppressed duplicates are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnBoundaries {
    /// Attribute name.
    pub name: String,
    /// Division the boundaries were computed for.
    pub division: Division,
    /// One entry per cut point, ascending.
    pub values: Vec<Option<f64>>,
}

impl ColumnBoundaries {
    /// Non-null boundaries strictly between the minimum and the maximum,
    /// highest first.
    pub fn rank_cuts(&self) -> Vec<f64> {
        let n = self.values.len();
        if n < 3 {
            return Vec::new();
        }
        let mut cuts: Vec<f64> = self.values[1..n - 1].iter().flatten().copied().collect();
        cuts.sort_by(|a, b| b.total_cmp(a));
        cuts
    }

    /// Rank of `value`: the 1-based index of the first cut it reaches.
    ///
    /// # Examples
    ///
    /// ```
    /// use gitpatterns_core::Division;
    /// use gitpatterns_convert::ColumnBoundaries;
    ///
    /// let b = ColumnBoundaries {
    ///     name: "pushes".into(),
    ///     division: Division::Quartile,
    ///     values: vec![Some(0.0), Some(2.0), Some(5.0), Some(9.0), Some(40.0)],
    /// };
    /// assert_eq!(b.rank(40.0), 1);
    /// assert_eq!(b.rank(9.0), 1);
    /// assert_eq!(b.rank(5.0), 2);
    /// assert_eq!(b.rank(3.0), 3);
    /// assert_eq!(b.rank(0.0), 4);
    /// ```
    pub fn rank(&self, value: f64) -> u32 {
        rank_in(&self.rank_cuts(), value)
    }

    /// Non-null boundaries, highest first.
    pub fn descending(&self) -> Vec<f64> {
        let mut values: Vec<f64> = self.values.iter().flatten().copied().collect();
        values.reverse();
        values
    }
}

fn rank_in(cuts: &[f64], value: f64) -> u32 {
    let pos = cuts.iter().position(|&cut| value >= cut).unwrap_or(cuts.len());
    pos as u32 + 1
}

/// Boundaries for every discretized attribute of a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryTable {
    /// Per-attribute boundaries in table column order.
    pub columns: Vec<ColumnBoundaries>,
}

impl BoundaryTable {
    /// Boundaries of `name`, if it was discretized.
    pub fn get(&self, name: &str) -> Option<&ColumnBoundaries> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Number of discretized attributes.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no attribute was discretized.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Boundaries whose division is `division`.
    pub fn with_division(&self, division: Division) -> impl Iterator<Item = &ColumnBoundaries> {
        self.columns.iter().filter(move |c| c.division == division)
    }
}

/// Quantile of sorted `values` at fraction `q` with linear interpolation.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    match sorted.get(lo + 1) {
        Some(&next) => sorted[lo] + (h - lo as f64) * (next - sorted[lo]),
        None => sorted[lo],
    }
}

/// Null every boundary equal to a higher one.
fn suppress_duplicates(values: &mut [Option<f64>]) {
    let mut seen = HashSet::new();
    for slot in values.iter_mut().rev() {
        if let Some(v) = *slot {
            // -0.0 and 0.0 are the same boundary.
            let key = if v == 0.0 { 0u64 } else { v.to_bits() };
            if !seen.insert(key) {
                *slot = None;
            }
        }
    }
}

/// Compute quantile boundaries for the numeric columns of `table` divided
/// into quartiles or deciles by `config`.
///
/// Columns that are not numeric, have division `none`, are missing from
/// `config`, or hold only nulls get no entry.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::{ColumnData, Division, QuantileConfig, RepoTable};
/// use gitpatterns_convert::compute_boundaries;
///
/// let table = RepoTable::new((0..5).map(|i| format!("r{i}")).collect())
///     .with_column("forks", ColumnData::Int((1..=5).map(Some).collect()))
///     .unwrap();
/// let config: QuantileConfig = [("forks", Division::Quartile)].into_iter().collect();
///
/// let boundaries = compute_boundaries(&table, &config);
/// assert_eq!(
///     boundaries.get("forks").unwrap().values,
///     vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)]
/// );
/// ```
pub fn compute_boundaries(table: &RepoTable, config: &QuantileConfig) -> BoundaryTable {
    let mut columns = Vec::new();
    for column in table.columns() {
        let division = match config.get(&column.name) {
            Some(d @ (Division::Quartile | Division::Decile)) => d,
            _ => continue,
        };
        let Some(values) = column.data.as_f64() else {
            continue;
        };
        let mut sorted: Vec<f64> = values.into_iter().flatten().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            continue;
        }
        sorted.sort_by(f64::total_cmp);

        let mut boundaries: Vec<Option<f64>> = division
            .cut_points()
            .iter()
            .map(|&q| Some(quantile(&sorted, q)))
            .collect();
        suppress_duplicates(&mut boundaries);
        debug!(column = %column.name, %division, ?boundaries, "computed boundaries");

        columns.push(ColumnBoundaries {
            name: column.name.clone(),
            division,
            values: boundaries,
        });
    }
    BoundaryTable { columns }
}

/// Replace every discretized column by its quantile ranks.
///
/// Nulls stay null. Columns without boundaries pass through unchanged.
pub fn assign_ranks(table: &RepoTable, boundaries: &BoundaryTable) -> RepoTable {
    table.map_columns(|column| {
        let (Some(b), Some(values)) = (boundaries.get(&column.name), column.data.as_f64()) else {
            return column.data.clone();
        };
        let cuts = b.rank_cuts();
        ColumnData::Rank(
            values
                .into_iter()
                .map(|v| v.map(|x| rank_in(&cuts, x)))
                .collect(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, data: ColumnData) -> RepoTable {
        let rows = data.len();
        RepoTable::new((0..rows).map(|i| format!("org/r{i}")).collect())
            .with_column(name, data)
            .unwrap()
    }

    fn config(name: &str, division: Division) -> QuantileConfig {
        [(name, division)].into_iter().collect()
    }

    #[test]
    fn interpolates_between_order_statistics() {
        let t = table("avg_push_size", ColumnData::Float(vec![Some(1.0), Some(2.0), Some(4.0), Some(8.0)]));
        let b = compute_boundaries(&t, &config("avg_push_size", Division::Quartile));
        // h = 3q: 0, .75, 1.5, 2.25, 3
        assert_eq!(
            b.get("avg_push_size").unwrap().values,
            vec![Some(1.0), Some(1.75), Some(3.0), Some(5.0), Some(8.0)]
        );
    }

    #[test]
    fn ignores_nulls_when_computing() {
        let t = table("forks", ColumnData::Int(vec![None, Some(10), None, Some(20)]));
        let b = compute_boundaries(&t, &config("forks", Division::Quartile));
        assert_eq!(b.get("forks").unwrap().values[0], Some(10.0));
        assert_eq!(b.get("forks").unwrap().values[4], Some(20.0));
    }

    #[test]
    fn suppresses_duplicates_from_the_top() {
        let t = table(
            "pushes",
            ColumnData::Int(vec![Some(0), Some(0), Some(0), Some(0), Some(7)]),
        );
        let b = compute_boundaries(&t, &config("pushes", Division::Quartile));
        // raw: 0, 0, 0, 0, 7
        assert_eq!(
            b.get("pushes").unwrap().values,
            vec![None, None, None, Some(0.0), Some(7.0)]
        );
    }

    #[test]
    fn constant_decile_column_keeps_only_max() {
        let t = table("watches", ColumnData::Int(vec![Some(5); 20]));
        let b = compute_boundaries(&t, &config("watches", Division::Decile));
        let values = &b.get("watches").unwrap().values;
        assert_eq!(values.len(), 11);
        assert_eq!(values.iter().flatten().count(), 1);
        assert_eq!(values[10], Some(5.0));

        let ranked = assign_ranks(&t, &b);
        assert_eq!(ranked.column("watches").unwrap().data, ColumnData::Rank(vec![Some(1); 20]));
    }

    #[test]
    fn skips_none_division_strings_and_empty_columns() {
        let t = RepoTable::new(vec!["a".into(), "b".into()])
            .with_column("forks", ColumnData::Int(vec![Some(1), Some(2)]))
            .unwrap()
            .with_column("issues", ColumnData::Int(vec![None, None]))
            .unwrap()
            .with_column("language", ColumnData::Str(vec![Some("Go".into()), None]))
            .unwrap()
            .with_column("pushes", ColumnData::Int(vec![Some(1), Some(2)]))
            .unwrap();
        let config: QuantileConfig = [
            ("forks", Division::None),
            ("issues", Division::Quartile),
            ("language", Division::Quartile),
        ]
        .into_iter()
        .collect();
        assert!(compute_boundaries(&t, &config).is_empty());
    }

    #[test]
    fn ranks_are_inclusive_and_top_is_one() {
        let values: Vec<Option<i64>> = (1..=9).map(Some).chain([None]).collect();
        let t = table("forks", ColumnData::Int(values));
        let b = compute_boundaries(&t, &config("forks", Division::Quartile));
        // boundaries: 1, 3, 5, 7, 9
        let ranked = assign_ranks(&t, &b);
        assert_eq!(
            ranked.column("forks").unwrap().data,
            ColumnData::Rank(vec![
                Some(4),
                Some(4),
                Some(3),
                Some(3),
                Some(2),
                Some(2),
                Some(1),
                Some(1),
                Some(1),
                None,
            ])
        );
    }

    #[test]
    fn unranked_columns_pass_through() {
        let t = RepoTable::new(vec!["a".into()])
            .with_column("language", ColumnData::Str(vec![Some("Rust".into())]))
            .unwrap();
        let ranked = assign_ranks(&t, &BoundaryTable::default());
        assert_eq!(ranked, t);
    }

    #[test]
    fn rank_cuts_skip_min_and_max() {
        let b = ColumnBoundaries {
            name: "x".into(),
            division: Division::Quartile,
            values: vec![Some(0.0), None, Some(4.0), Some(6.0), Some(10.0)],
        };
        assert_eq!(b.rank_cuts(), vec![6.0, 4.0]);
        assert_eq!(b.descending(), vec![10.0, 6.0, 4.0, 0.0]);
        assert_eq!(b.rank(-1.0), 3);
    }
}
