//! Association pattern mining over repository transactions.
//!
//! Finds frequent itemsets with Apriori and turns them into association
//! rules filtered by lift, confidence and rule shape.

pub mod itemsets;
pub mod rules;

pub use itemsets::{frequent_itemsets, FrequentItemset};
pub use rules::{mine_patterns, render_items, AssociationRule, RuleTable};
