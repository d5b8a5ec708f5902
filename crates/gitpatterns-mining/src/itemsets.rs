//! Frequent itemset search (Apriori).
//!
//! Level `k` candidates are joined from frequent `(k-1)`-itemsets sharing
//! their first `k-2` items, pruned when any `(k-1)`-subset is infrequent,
//! and counted in parallel against the immutable matrix.

use std::collections::HashSet;

use gitpatterns_core::TransactionMatrix;
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

/// An itemset whose support reached the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequentItemset {
    /// Item indices, ascending.
    pub items: Vec<usize>,
    /// Transactions containing every item.
    pub count: usize,
    /// `count / rows`.
    pub support: f64,
}

/// Find every itemset with support at least `min_support`.
///
/// Itemsets longer than `max_len` are not searched. Results are ordered by
/// length, then by item indices.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::TransactionMatrix;
/// use gitpatterns_mining::frequent_itemsets;
///
/// let matrix = TransactionMatrix::from_columns(
///     4,
///     vec![
///         ("a".into(), vec![true, true, true, false]),
///         ("b".into(), vec![true, true, false, false]),
///         ("c".into(), vec![false, false, false, true]),
///     ],
/// )
/// .unwrap();
///
/// let frequent = frequent_itemsets(&matrix, 0.5, None);
/// let sets: Vec<_> = frequent.iter().map(|f| f.items.clone()).collect();
/// assert_eq!(sets, vec![vec![0], vec![1], vec![0, 1]]);
/// ```
pub fn frequent_itemsets(
    matrix: &TransactionMatrix,
    min_support: f64,
    max_len: Option<usize>,
) -> Vec<FrequentItemset> {
    let rows = matrix.row_count();
    if rows == 0 {
        return Vec::new();
    }
    let support_of = |count: usize| count as f64 / rows as f64;

    let mut level: Vec<FrequentItemset> = (0..matrix.item_count())
        .into_par_iter()
        .filter_map(|item| {
            let count = matrix.count_all(&[item]);
            let support = support_of(count);
            (count > 0 && support >= min_support).then(|| FrequentItemset {
                items: vec![item],
                count,
                support,
            })
        })
        .collect();

    let mut all = Vec::new();
    let mut k = 1;
    while !level.is_empty() {
        debug!(k, frequent = level.len(), "apriori level");
        if max_len.is_some_and(|max| k >= max) {
            all.append(&mut level);
            break;
        }
        let candidates = generate_candidates(&level);
        all.append(&mut level);
        k += 1;

        level = candidates
            .into_par_iter()
            .filter_map(|items| {
                let count = matrix.count_all(&items);
                let support = support_of(count);
                (count > 0 && support >= min_support).then_some(FrequentItemset {
                    items,
                    count,
                    support,
                })
            })
            .collect();
        level.sort_by(|a, b| a.items.cmp(&b.items));
    }
    all
}

/// Join step plus subset pruning. `level` must be sorted by items.
fn generate_candidates(level: &[FrequentItemset]) -> Vec<Vec<usize>> {
    let known: HashSet<&[usize]> = level.iter().map(|f| f.items.as_slice()).collect();
    let mut candidates = Vec::new();

    for (i, a) in level.iter().enumerate() {
        let prefix = &a.items[..a.items.len() - 1];
        for b in &level[i + 1..] {
            let (prefix_b, last_b) = b.items.split_at(b.items.len() - 1);
            // Sorted input: once the prefix differs no later set shares it.
            if prefix != prefix_b {
                break;
            }
            let mut candidate = a.items.clone();
            candidate.push(last_b[0]);

            let all_subsets_frequent = (0..candidate.len()).all(|skip| {
                let subset: Vec<usize> = candidate
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != skip)
                    .map(|(_, &item)| item)
                    .collect();
                known.contains(subset.as_slice())
            });
            if all_subsets_frequent {
                candidates.push(candidate);
            }
        }
    }
    candidates
}
