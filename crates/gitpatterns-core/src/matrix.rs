//! Boolean item × transaction matrix.
//!
//! Stored column-major: every item owns a packed bitset with one bit per
//! transaction, so the support of an itemset is a bitwise AND followed by a
//! population count.

use std::collections::HashMap;

use crate::error::PatternsError;

const WORD_BITS: usize = 64;

fn words_for(rows: usize) -> usize {
    rows.div_ceil(WORD_BITS)
}

/// Transaction matrix: rows are repositories, columns are items.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::TransactionMatrix;
///
/// let matrix = TransactionMatrix::from_columns(
///     3,
///     vec![
///         ("pushes 1".to_string(), vec![true, true, false]),
///         ("language_Go".to_string(), vec![true, false, false]),
///     ],
/// )
/// .unwrap();
/// let both = [0, 1];
/// assert_eq!(matrix.count_all(&both), 1);
/// assert!((matrix.support(&[0]) - 2.0 / 3.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionMatrix {
    rows: usize,
    items: Vec<String>,
    index: HashMap<String, usize>,
    bits: Vec<Vec<u64>>,
}

impl TransactionMatrix {
    /// An empty matrix with `rows` transactions and no items.
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Build a matrix from `(item, membership)` columns.
    ///
    /// # Errors
    ///
    /// Returns [`PatternsError::Config`] on a duplicate item name or a
    /// membership vector whose length is not `rows`.
    pub fn from_columns(
        rows: usize,
        columns: Vec<(String, Vec<bool>)>,
    ) -> Result<Self, PatternsError> {
        let mut matrix = Self::new(rows);
        for (name, membership) in columns {
            if membership.len() != rows {
                return Err(PatternsError::Config(format!(
                    "item '{name}' has {} cells, matrix has {rows} rows",
                    membership.len()
                )));
            }
            if matrix.item_index(&name).is_some() {
                return Err(PatternsError::Config(format!("duplicate item '{name}'")));
            }
            let item = matrix.insert_item(name);
            for (row, present) in membership.into_iter().enumerate() {
                if present {
                    matrix.set(row, item);
                }
            }
        }
        Ok(matrix)
    }

    /// Index of `name`, adding it as an all-false column when new.
    pub fn insert_item(&mut self, name: impl Into<String>) -> usize {
        let name = name.into();
        if let Some(&i) = self.index.get(&name) {
            return i;
        }
        let i = self.items.len();
        self.index.insert(name.clone(), i);
        self.items.push(name);
        self.bits.push(vec![0; words_for(self.rows)]);
        i
    }

    /// Mark `item` present in transaction `row`. Out-of-range rows are ignored.
    pub fn set(&mut self, row: usize, item: usize) {
        if row < self.rows {
            if let Some(bits) = self.bits.get_mut(item) {
                bits[row / WORD_BITS] |= 1u64 << (row % WORD_BITS);
            }
        }
    }

    /// Whether transaction `row` contains `item`.
    pub fn contains(&self, row: usize, item: usize) -> bool {
        row < self.rows
            && self
                .bits
                .get(item)
                .is_some_and(|bits| bits[row / WORD_BITS] & (1u64 << (row % WORD_BITS)) != 0)
    }

    /// Number of transactions.
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Number of items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Whether the matrix has no transactions or no items.
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.items.is_empty()
    }

    /// Item names in column order.
    pub fn items(&self) -> &[String] {
        &self.items
    }

    /// Column index of `name`.
    pub fn item_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Name of item `item`.
    pub fn item_name(&self, item: usize) -> Option<&str> {
        self.items.get(item).map(String::as_str)
    }

    /// Packed membership bits of `item`.
    pub fn item_bits(&self, item: usize) -> &[u64] {
        self.bits.get(item).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of transactions containing every item in `items`.
    ///
    /// An empty itemset is contained in every transaction.
    pub fn count_all(&self, items: &[usize]) -> usize {
        let Some((&first, rest)) = items.split_first() else {
            return self.rows;
        };
        let mut acc = self.item_bits(first).to_vec();
        for &item in rest {
            for (a, b) in acc.iter_mut().zip(self.item_bits(item)) {
                *a &= *b;
            }
        }
        acc.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Fraction of transactions containing every item in `items`.
    pub fn support(&self, items: &[usize]) -> f64 {
        if self.rows == 0 {
            return 0.0;
        }
        self.count_all(items) as f64 / self.rows as f64
    }

    /// Names of the items present in transaction `row`.
    pub fn row_items(&self, row: usize) -> Vec<&str> {
        (0..self.items.len())
            .filter(|&item| self.contains(row, item))
            .map(|item| self.items[item].as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> TransactionMatrix {
        TransactionMatrix::from_columns(
            4,
            vec![
                ("a".into(), vec![true, true, false, true]),
                ("b".into(), vec![true, false, false, true]),
                ("c".into(), vec![false, false, true, false]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn counts_and_support() {
        let m = small();
        assert_eq!(m.count_all(&[0]), 3);
        assert_eq!(m.count_all(&[0, 1]), 2);
        assert_eq!(m.count_all(&[0, 2]), 0);
        assert_eq!(m.count_all(&[]), 4);
        assert!((m.support(&[1]) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn bits_span_multiple_words() {
        let rows = 130;
        let membership: Vec<bool> = (0..rows).map(|r| r % 2 == 0 || r == 129).collect();
        let m = TransactionMatrix::from_columns(rows, vec![("x".into(), membership)]).unwrap();
        assert_eq!(m.count_all(&[0]), 66);
        assert!(m.contains(129, 0));
        assert!(!m.contains(127, 0));
        assert!(!m.contains(500, 0));
    }

    #[test]
    fn duplicate_items_rejected() {
        let err = TransactionMatrix::from_columns(
            1,
            vec![("a".into(), vec![true]), ("a".into(), vec![false])],
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate item"));
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(TransactionMatrix::from_columns(2, vec![("a".into(), vec![true])]).is_err());
    }

    #[test]
    fn row_items_lists_members() {
        let m = small();
        assert_eq!(m.row_items(0), vec!["a", "b"]);
        assert_eq!(m.row_items(2), vec!["c"]);
    }
}
