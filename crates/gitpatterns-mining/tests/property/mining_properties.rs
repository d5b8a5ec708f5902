use gitpatterns_core::{MiningParams, PatternsError, TransactionMatrix};
use gitpatterns_mining::{frequent_itemsets, mine_patterns};
use proptest::prelude::*;

fn arb_matrix() -> impl Strategy<Value = TransactionMatrix> {
    (5usize..40, 2usize..6).prop_flat_map(|(rows, items)| {
        prop::collection::vec(prop::collection::vec(prop::bool::weighted(0.6), rows), items)
            .prop_map(move |columns| {
                TransactionMatrix::from_columns(
                    rows,
                    columns
                        .into_iter()
                        .enumerate()
                        .map(|(i, bits)| (format!("item {i}"), bits))
                        .collect(),
                )
                .unwrap()
            })
    })
}

fn arb_params() -> impl Strategy<Value = MiningParams> {
    (0.05f64..0.8, 0.0f64..1.0, 0.0f64..2.0, 1usize..3, 1usize..3).prop_map(
        |(min_support, min_confidence, min_lift, max_antecedents, max_consequents)| MiningParams {
            min_support,
            min_confidence,
            min_lift,
            min_antecedents: 1,
            min_consequents: 1,
            max_antecedents,
            max_consequents,
        },
    )
}

// ── Support anti-monotonicity ───────────────────────────────────────────

proptest! {
    #[test]
    fn subsets_are_at_least_as_frequent(matrix in arb_matrix(), min_support in 0.05f64..0.7) {
        let frequent = frequent_itemsets(&matrix, min_support, None);
        for itemset in &frequent {
            prop_assert!(itemset.support >= min_support);
            prop_assert_eq!(itemset.count, matrix.count_all(&itemset.items));
            for skip in 0..itemset.items.len() {
                let subset: Vec<usize> = itemset
                    .items
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != skip)
                    .map(|(_, &item)| item)
                    .collect();
                prop_assert!(matrix.count_all(&subset) >= itemset.count);
                if !subset.is_empty() {
                    prop_assert!(frequent.iter().any(|f| f.items == subset));
                }
            }
        }
    }
}

// ── Rule filter bounds ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn every_rule_respects_the_filters(matrix in arb_matrix(), params in arb_params()) {
        match mine_patterns(&matrix, &params) {
            Ok(table) => {
                prop_assert!(!table.is_empty());
                for rule in &table {
                    prop_assert!(rule.lift >= params.min_lift - 1e-4);
                    if params.min_confidence > 0.0 {
                        prop_assert!(rule.confidence >= params.min_confidence);
                    }
                    prop_assert!(rule.support >= params.min_support - 1e-4);
                    prop_assert!((1..=params.max_antecedents).contains(&rule.antecedents.len()));
                    prop_assert!((1..=params.max_consequents).contains(&rule.consequents.len()));
                    prop_assert!(rule.antecedents.iter().all(|a| !rule.consequents.contains(a)));
                    prop_assert!(rule.confidence <= 1.0);
                }
            }
            Err(err) => prop_assert!(matches!(err, PatternsError::NoPatterns(_)), "{}", err),
        }
    }
}
