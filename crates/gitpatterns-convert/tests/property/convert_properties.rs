use gitpatterns_convert::{assign_ranks, clean, compute_boundaries, convert_to_transactions};
use gitpatterns_core::{
    AttributeCatalog, ColumnData, Division, Locale, QuantileConfig, RepoTable,
};
use proptest::prelude::*;

fn arb_division() -> impl Strategy<Value = Division> {
    prop_oneof![Just(Division::Quartile), Just(Division::Decile)]
}

fn arb_values() -> impl Strategy<Value = Vec<Option<i64>>> {
    prop::collection::vec(prop::option::weighted(0.9, 0i64..50), 1..60)
}

fn single_column(name: &str, values: Vec<Option<i64>>) -> RepoTable {
    let repos = (0..values.len()).map(|i| format!("org/r{i}")).collect();
    RepoTable::new(repos)
        .with_column(name, ColumnData::Int(values))
        .unwrap()
}

fn catalog() -> AttributeCatalog {
    AttributeCatalog::builtin().unwrap()
}

// ── Rank monotonicity ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn higher_values_never_rank_lower(values in arb_values(), division in arb_division()) {
        let table = single_column("pushes", values.clone());
        let config: QuantileConfig = [("pushes", division)].into_iter().collect();
        let boundaries = compute_boundaries(&table, &config);
        let ranked = assign_ranks(&table, &boundaries);

        let ColumnData::Rank(ranks) = &ranked.column("pushes").unwrap().data else {
            // Only possible when every value is null.
            prop_assert!(values.iter().all(Option::is_none));
            return Ok(());
        };
        let buckets = division.cut_points().len() as u32 - 1;
        for (i, a) in values.iter().enumerate() {
            prop_assert_eq!(a.is_none(), ranks[i].is_none());
            for (j, b) in values.iter().enumerate() {
                if let (Some(a), Some(b)) = (a, b) {
                    let (ra, rb) = (ranks[i].unwrap(), ranks[j].unwrap());
                    prop_assert!((1..=buckets).contains(&ra));
                    if a >= b {
                        prop_assert!(ra <= rb, "{} ranked {} but {} ranked {}", a, ra, b, rb);
                    }
                }
            }
        }
    }
}

// ── Boundary dedup ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn retained_boundaries_are_unique_and_keep_the_max(
        values in arb_values(),
        division in arb_division(),
    ) {
        let table = single_column("forks", values.clone());
        let config: QuantileConfig = [("forks", division)].into_iter().collect();
        let boundaries = compute_boundaries(&table, &config);

        let Some(max) = values.iter().flatten().max() else {
            prop_assert!(boundaries.is_empty());
            return Ok(());
        };
        let column = boundaries.get("forks").unwrap();
        prop_assert_eq!(column.values.len(), division.cut_points().len());
        prop_assert_eq!(column.values.last().copied().flatten(), Some(*max as f64));

        let kept: Vec<f64> = column.values.iter().flatten().copied().collect();
        for pair in kept.windows(2) {
            prop_assert!(pair[0] < pair[1], "boundaries not strictly increasing: {:?}", kept);
        }
    }
}

// ── Cleaner idempotence ─────────────────────────────────────────────────

fn arb_table() -> impl Strategy<Value = RepoTable> {
    (1usize..30).prop_flat_map(|rows| {
        (
            prop::collection::vec(0usize..5, rows),
            prop::collection::vec(prop::option::of(0i64..3), rows),
            prop::collection::vec(prop::option::of(0i64..3), rows),
            prop::collection::vec(
                prop::option::of(prop::sample::select(vec!["Go", "Rust", "None"])),
                rows,
            ),
        )
            .prop_map(|(repos, pushes, forks, language)| {
                RepoTable::new(repos.into_iter().map(|r| format!("org/r{r}")).collect())
                    .with_column("pushes", ColumnData::Int(pushes))
                    .unwrap()
                    .with_column("forks", ColumnData::Int(forks))
                    .unwrap()
                    .with_column(
                        "language",
                        ColumnData::Str(
                            language.into_iter().map(|v| v.map(str::to_string)).collect(),
                        ),
                    )
                    .unwrap()
            })
    })
}

proptest! {
    #[test]
    fn cleaning_twice_equals_cleaning_once(table in arb_table()) {
        let config: QuantileConfig = [
            ("pushes", Division::Quartile),
            ("forks", Division::Decile),
            ("language", Division::None),
        ]
        .into_iter()
        .collect();
        let once = clean(&table, &config, &catalog());
        let twice = clean(&once, &config, &catalog());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn each_attribute_contributes_at_most_one_item(table in arb_table()) {
        let config: QuantileConfig = [
            ("pushes", Division::Quartile),
            ("forks", Division::None),
            ("language", Division::None),
        ]
        .into_iter()
        .collect();
        let cleaned = clean(&table, &config, &catalog());
        let conversion = convert_to_transactions(&table, &config, &catalog(), Locale::En);
        let matrix = &conversion.transactions;
        prop_assert_eq!(matrix.row_count(), cleaned.row_count());

        for row in 0..matrix.row_count() {
            let expected = cleaned
                .columns()
                .iter()
                .filter(|c| {
                    let cell = c.data.cell(row);
                    !cell.is_null() && cell != gitpatterns_core::Cell::Str("None")
                })
                .count();
            prop_assert_eq!(matrix.row_items(row).len(), expected);
        }
    }
}
