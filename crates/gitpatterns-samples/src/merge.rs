use gitpatterns_core::{PatternsError, QuantileConfig, RepoTable};
use tracing::info;

use crate::loader::Sample;

/// Merge sample batches collected with the same attribute divisions.
///
/// Returns the stacked table and the shared division configuration.
/// Divisions are compared before any rows are concatenated.
///
/// # Errors
///
/// Returns [`PatternsError::EmptyTable`] when `samples` is empty or holds
/// no rows, and [`PatternsError::ConfigMismatch`] naming the first
/// attribute whose division differs between two batches.
pub fn merge_samples(samples: &[Sample]) -> Result<(RepoTable, QuantileConfig), PatternsError> {
    let Some((first, rest)) = samples.split_first() else {
        return Err(PatternsError::EmptyTable("no samples to merge".into()));
    };
    let reference = &first.manifest.attributes;
    for (i, sample) in rest.iter().enumerate() {
        if let Some(detail) = describe_mismatch(reference, &sample.manifest.attributes) {
            return Err(PatternsError::ConfigMismatch(format!(
                "sample 1 and sample {}: {detail}",
                i + 2
            )));
        }
    }

    let tables: Vec<RepoTable> = samples.iter().map(|s| s.table.clone()).collect();
    let merged = RepoTable::concat(&tables)?;
    if merged.is_empty() {
        return Err(PatternsError::EmptyTable("merged samples hold no rows".into()));
    }
    info!(
        samples = samples.len(),
        rows = merged.row_count(),
        "merged samples"
    );
    Ok((merged, reference.clone()))
}

fn describe_mismatch(a: &QuantileConfig, b: &QuantileConfig) -> Option<String> {
    for (column, division) in a.iter() {
        match b.get(column) {
            None => return Some(format!("'{column}' is missing from the second batch")),
            Some(other) if other != division => {
                return Some(format!("'{column}' is {division} in one batch and {other} in the other"))
            }
            Some(_) => {}
        }
    }
    b.iter()
        .find(|(column, _)| !a.contains(column))
        .map(|(column, _)| format!("'{column}' is missing from the first batch"))
}
