//! Association rule generation and filtering.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use gitpatterns_core::{MiningParams, PatternsError, TransactionMatrix};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::itemsets::{frequent_itemsets, FrequentItemset};

/// Metric precision of reported rules.
const DECIMALS: i32 = 4;

/// A rule `antecedents ⇒ consequents`.
///
/// # Examples
///
/// ```
/// use gitpatterns_mining::AssociationRule;
///
/// let rule = AssociationRule::new(
///     vec!["pushes 1".into()],
///     vec!["language Go".into()],
///     0.6,
///     1.0,
///     1.25,
/// );
/// assert_eq!(rule.antecedents_display, "(pushes 1)");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationRule {
    /// Left-hand side items.
    pub antecedents: Vec<String>,
    /// Right-hand side items.
    pub consequents: Vec<String>,
    /// Left-hand side rendered as `"(a), (b)"`.
    pub antecedents_display: String,
    /// Right-hand side rendered as `"(a), (b)"`.
    pub consequents_display: String,
    /// Share of transactions containing both sides.
    pub support: f64,
    /// `support(A ∪ C) / support(A)`.
    pub confidence: f64,
    /// `confidence / support(C)`.
    pub lift: f64,
}

impl AssociationRule {
    /// Build a rule, rendering both sides for display.
    pub fn new(
        antecedents: Vec<String>,
        consequents: Vec<String>,
        support: f64,
        confidence: f64,
        lift: f64,
    ) -> Self {
        Self {
            antecedents_display: render_items(&antecedents),
            consequents_display: render_items(&consequents),
            antecedents,
            consequents,
            support,
            confidence,
            lift,
        }
    }
}

/// Render an item set as `"(a), (b)"`.
pub fn render_items(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("({item})"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Mined rules plus the counts that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleTable {
    /// Rules sorted by lift, confidence, then support, all descending.
    pub rules: Vec<AssociationRule>,
    /// Transactions mined.
    pub transactions: usize,
    /// Frequent itemsets found.
    pub frequent_itemsets: usize,
}

impl RuleTable {
    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rule survived. Never true for a table returned by [`mine_patterns`].
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate over the rules.
    pub fn iter(&self) -> std::slice::Iter<'_, AssociationRule> {
        self.rules.iter()
    }
}

impl<'a> IntoIterator for &'a RuleTable {
    type Item = &'a AssociationRule;
    type IntoIter = std::slice::Iter<'a, AssociationRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl RuleTable {
    /// Render as a GitHub-flavored Markdown table.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("# Association Rules\n\n");
        out.push_str(&format!(
            "**Transactions:** {} | **Frequent itemsets:** {} | **Rules:** {}\n\n",
            self.transactions,
            self.frequent_itemsets,
            self.rules.len()
        ));
        out.push_str("| Antecedents | Consequents | Support | Confidence | Lift |\n");
        out.push_str("|-------------|-------------|---------|------------|------|\n");
        for rule in &self.rules {
            out.push_str(&format!(
                "| {} | {} | {:.4} | {:.4} | {:.4} |\n",
                rule.antecedents_display, rule.consequents_display, rule.support, rule.confidence, rule.lift
            ));
        }
        out
    }
}

impl fmt::Display for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Association Rules")?;
        writeln!(f, "=================")?;
        writeln!(
            f,
            "{} rules from {} transactions ({} frequent itemsets)\n",
            self.rules.len(),
            self.transactions,
            self.frequent_itemsets
        )?;
        let lhs_width = self
            .rules
            .iter()
            .map(|r| r.antecedents_display.chars().count())
            .max()
            .unwrap_or(0)
            .max("Antecedents".len());
        let rhs_width = self
            .rules
            .iter()
            .map(|r| r.consequents_display.chars().count())
            .max()
            .unwrap_or(0)
            .max("Consequents".len());
        writeln!(
            f,
            "{:<lhs_width$}  {:<rhs_width$}  {:>8}  {:>10}  {:>7}",
            "Antecedents", "Consequents", "Support", "Confidence", "Lift"
        )?;
        writeln!(f, "{}", "-".repeat(lhs_width + rhs_width + 35))?;
        for rule in &self.rules {
            writeln!(
                f,
                "{:<lhs_width$}  {:<rhs_width$}  {:>8.4}  {:>10.4}  {:>7.4}",
                rule.antecedents_display, rule.consequents_display, rule.support, rule.confidence, rule.lift
            )?;
        }
        Ok(())
    }
}

/// A rule over item indices with unrounded metrics.
#[derive(Debug, Clone)]
struct RawRule {
    antecedents: Vec<usize>,
    consequents: Vec<usize>,
    support: f64,
    confidence: f64,
    lift: f64,
}

fn round(value: f64) -> f64 {
    let scale = 10f64.powi(DECIMALS);
    (value * scale).round() / scale
}

/// Every split of every frequent itemset with two or more items.
fn generate_rules(frequent: &[FrequentItemset], rows: usize) -> Vec<RawRule> {
    let counts: HashMap<&[usize], usize> = frequent
        .iter()
        .map(|f| (f.items.as_slice(), f.count))
        .collect();
    let support = |items: &[usize]| counts.get(items).map(|&c| c as f64 / rows as f64);

    let mut rules = Vec::new();
    for itemset in frequent.iter().filter(|f| f.items.len() >= 2) {
        let n = itemset.items.len();
        // Bit i of `mask` puts item i on the left-hand side.
        for mask in 1u32..(1 << n) - 1 {
            let mut antecedents = Vec::with_capacity(n);
            let mut consequents = Vec::with_capacity(n);
            for (i, &item) in itemset.items.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    antecedents.push(item);
                } else {
                    consequents.push(item);
                }
            }

            // Subsets of a frequent itemset are frequent, so both lookups succeed.
            let (Some(sa), Some(sc)) = (
                support(antecedents.as_slice()),
                support(consequents.as_slice()),
            ) else {
                continue;
            };
            let confidence = itemset.support / sa;
            rules.push(RawRule {
                antecedents,
                consequents,
                support: itemset.support,
                confidence,
                lift: confidence / sc,
            });
        }
    }
    rules
}

fn no_patterns(stage: &str) -> PatternsError {
    PatternsError::NoPatterns(stage.to_string())
}

/// Mine association rules from a transaction matrix.
///
/// # Errors
///
/// Returns [`PatternsError::InvalidParameter`] when `params` fail
/// validation, and [`PatternsError::NoPatterns`] as soon as a stage leaves
/// nothing: no frequent itemset, no rule reaching `min_lift`, no rule
/// reaching `min_confidence`, or no rule within the size bounds.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::{MiningParams, TransactionMatrix};
/// use gitpatterns_mining::mine_patterns;
///
/// let matrix = TransactionMatrix::from_columns(
///     5,
///     vec![
///         ("pushes 1".into(), vec![true, true, true, false, false]),
///         ("language Go".into(), vec![true, true, true, false, false]),
///     ],
/// )
/// .unwrap();
/// let params = MiningParams { min_support: 0.5, min_confidence: 0.5, ..MiningParams::default() };
///
/// let table = mine_patterns(&matrix, &params).unwrap();
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.rules[0].support, 0.6);
/// assert_eq!(table.rules[0].lift, 1.6667);
/// ```
pub fn mine_patterns(
    matrix: &TransactionMatrix,
    params: &MiningParams,
) -> Result<RuleTable, PatternsError> {
    params.validate()?;

    // Frequent itemsets.
    let max_len = params.max_antecedents.saturating_add(params.max_consequents);
    let frequent = frequent_itemsets(matrix, params.min_support, Some(max_len));
    info!(
        transactions = matrix.row_count(),
        items = matrix.item_count(),
        frequent = frequent.len(),
        "mined frequent itemsets"
    );
    if frequent.is_empty() {
        return Err(no_patterns(&format!(
            "no itemset reaches min_support {}",
            params.min_support
        )));
    }

    // Rules passing the lift threshold.
    let mut rules: Vec<RawRule> = generate_rules(&frequent, matrix.row_count())
        .into_iter()
        .filter(|r| r.lift >= params.min_lift)
        .collect();
    debug!(rules = rules.len(), min_lift = params.min_lift, "lift filter");
    if rules.is_empty() {
        return Err(no_patterns(&format!(
            "no rule reaches min_lift {}",
            params.min_lift
        )));
    }

    // Reported precision.
    for rule in &mut rules {
        rule.support = round(rule.support);
        rule.confidence = round(rule.confidence);
        rule.lift = round(rule.lift);
    }

    // Confidence, skipped when the threshold is zero.
    if params.min_confidence > 0.0 {
        rules.retain(|r| r.confidence >= params.min_confidence);
        debug!(rules = rules.len(), min_confidence = params.min_confidence, "confidence filter");
        if rules.is_empty() {
            return Err(no_patterns(&format!(
                "no rule reaches min_confidence {}",
                params.min_confidence
            )));
        }
    }

    // Rule shape.
    let antecedent_range = params.min_antecedents..=params.max_antecedents;
    let consequent_range = params.min_consequents..=params.max_consequents;
    rules.retain(|r| {
        antecedent_range.contains(&r.antecedents.len())
            && consequent_range.contains(&r.consequents.len())
    });
    if rules.is_empty() {
        return Err(no_patterns(&format!(
            "no rule has {}-{} antecedents and {}-{} consequents",
            params.min_antecedents,
            params.max_antecedents,
            params.min_consequents,
            params.max_consequents
        )));
    }

    // Names and display strings.
    let names = |items: &[usize]| -> Vec<String> {
        items
            .iter()
            .filter_map(|&i| matrix.item_name(i))
            .map(str::to_string)
            .collect()
    };
    let mut output: Vec<AssociationRule> = rules
        .iter()
        .map(|r| {
            AssociationRule::new(
                names(r.antecedents.as_slice()),
                names(r.consequents.as_slice()),
                r.support,
                r.confidence,
                r.lift,
            )
        })
        .collect();
    output.sort_by(|a, b| {
        b.lift
            .partial_cmp(&a.lift)
            .unwrap_or(Ordering::Equal)
            .then(b.confidence.partial_cmp(&a.confidence).unwrap_or(Ordering::Equal))
            .then(b.support.partial_cmp(&a.support).unwrap_or(Ordering::Equal))
            .then_with(|| a.antecedents_display.cmp(&b.antecedents_display))
            .then_with(|| a.consequents_display.cmp(&b.consequents_display))
    });
    info!(rules = output.len(), "mined association rules");

    Ok(RuleTable {
        rules: output,
        transactions: matrix.row_count(),
        frequent_itemsets: frequent.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ten transactions over four items with known co-occurrence.
    fn sample() -> TransactionMatrix {
        let column = |bits: &str| bits.chars().map(|c| c == '1').collect::<Vec<_>>();
        TransactionMatrix::from_columns(
            10,
            vec![
                ("pushes 1".into(), column("1111110000")),
                ("language Go".into(), column("1111100000")),
                ("forks 2".into(), column("0000011111")),
                ("license MIT".into(), column("1010101010")),
            ],
        )
        .unwrap()
    }

    fn params(min_support: f64, min_confidence: f64, min_lift: f64) -> MiningParams {
        MiningParams {
            min_support,
            min_confidence,
            min_lift,
            ..MiningParams::default()
        }
    }

    fn find<'a>(table: &'a RuleTable, lhs: &str, rhs: &str) -> Option<&'a AssociationRule> {
        table
            .iter()
            .find(|r| r.antecedents_display == lhs && r.consequents_display == rhs)
    }

    #[test]
    fn metrics_match_hand_computation() {
        let table = mine_patterns(&sample(), &params(0.3, 0.0, 0.0)).unwrap();
        let rule = find(&table, "(language Go)", "(pushes 1)").unwrap();
        assert_eq!(rule.support, 0.5);
        assert_eq!(rule.confidence, 1.0);
        // 1.0 / 0.6
        assert_eq!(rule.lift, 1.6667);

        let rule = find(&table, "(pushes 1)", "(language Go)").unwrap();
        assert_eq!(rule.confidence, 0.8333);
        assert_eq!(rule.lift, 1.6667);
    }

    #[test]
    fn lift_filter_drops_negatively_associated_pairs() {
        let all = mine_patterns(&sample(), &params(0.2, 0.0, 0.0)).unwrap();
        // 0.4 / 0.5
        assert_eq!(find(&all, "(forks 2)", "(license MIT)").unwrap().lift, 0.8);

        let table = mine_patterns(&sample(), &params(0.2, 0.0, 1.0)).unwrap();
        assert!(table.iter().all(|r| r.lift >= 1.0));
        assert!(find(&table, "(forks 2)", "(license MIT)").is_none());
    }

    #[test]
    fn confidence_filter_uses_rounded_values() {
        let table = mine_patterns(&sample(), &params(0.3, 0.8333, 0.0)).unwrap();
        assert!(find(&table, "(pushes 1)", "(language Go)").is_some());
        let table = mine_patterns(&sample(), &params(0.3, 0.8334, 0.0)).unwrap();
        assert!(find(&table, "(pushes 1)", "(language Go)").is_none());
    }

    #[test]
    fn sorted_by_lift_then_confidence_then_support() {
        let table = mine_patterns(&sample(), &params(0.1, 0.0, 0.0)).unwrap();
        for pair in table.rules.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.lift > b.lift
                    || (a.lift == b.lift && a.confidence > b.confidence)
                    || (a.lift == b.lift && a.confidence == b.confidence && a.support >= b.support),
                "{a:?} before {b:?}"
            );
        }
    }

    #[test]
    fn size_bounds_apply_to_both_sides() {
        let mut p = params(0.1, 0.0, 0.0);
        p.min_antecedents = 2;
        p.max_antecedents = 2;
        p.max_consequents = 1;
        let table = mine_patterns(&sample(), &p).unwrap();
        assert!(!table.is_empty());
        for rule in &table {
            assert_eq!(rule.antecedents.len(), 2);
            assert_eq!(rule.consequents.len(), 1);
            assert_eq!(rule.antecedents_display.matches("), (").count(), 1);
        }
    }

    #[test]
    fn unbounded_rule_sizes_do_not_overflow() {
        let mut p = params(0.3, 0.0, 0.0);
        p.max_antecedents = usize::MAX;
        p.max_consequents = usize::MAX;
        let table = mine_patterns(&sample(), &p).unwrap();
        assert!(find(&table, "(pushes 1)", "(language Go)").is_some());
    }

    #[test]
    fn each_emptying_stage_raises_no_patterns() {
        let m = sample();
        let err = mine_patterns(&m, &params(0.9, 0.0, 0.0)).unwrap_err();
        assert!(err.to_string().contains("min_support"));

        let err = mine_patterns(&m, &params(0.3, 0.0, 5.0)).unwrap_err();
        assert!(err.to_string().contains("min_lift"));

        // a and b overlap in 3 of 10 rows: confidence 0.6 both ways.
        let column = |bits: &str| bits.chars().map(|c| c == '1').collect::<Vec<_>>();
        let overlap = TransactionMatrix::from_columns(
            10,
            vec![("a".into(), column("1111100000")), ("b".into(), column("0011111000"))],
        )
        .unwrap();
        let err = mine_patterns(&overlap, &params(0.3, 0.9, 1.0)).unwrap_err();
        assert!(err.to_string().contains("min_confidence"));

        let mut p = params(0.5, 0.0, 0.0);
        p.min_antecedents = 3;
        let err = mine_patterns(&m, &p).unwrap_err();
        assert!(err.to_string().contains("antecedents"));
    }

    #[test]
    fn invalid_params_fail_before_mining() {
        let err = mine_patterns(&sample(), &params(0.0, 0.5, 1.0)).unwrap_err();
        assert!(matches!(err, PatternsError::InvalidParameter(_)));
    }

    #[test]
    fn render_joins_items() {
        assert_eq!(render_items(&["a b".into(), "c".into()]), "(a b), (c)");
        assert_eq!(render_items(&[]), "");
    }

    #[test]
    fn text_and_markdown_list_every_rule() {
        let table = mine_patterns(&sample(), &params(0.5, 0.5, 1.0)).unwrap();
        let text = table.to_string();
        assert!(text.contains("Association Rules"));
        assert!(text.contains("(language Go)"));
        assert!(text.contains("1.6667"));

        let md = table.to_markdown();
        assert_eq!(md.lines().filter(|l| l.starts_with("| (")).count(), table.len());
        assert!(md.contains("| Antecedents | Consequents |"));
    }

    #[test]
    fn rule_table_serializes_camel_case() {
        let table = mine_patterns(&sample(), &params(0.5, 0.5, 1.0)).unwrap();
        let json = serde_json::to_value(&table).unwrap();
        assert!(json["rules"][0]["antecedentsDisplay"].is_string());
        assert_eq!(json["transactions"], 10);
    }
}
