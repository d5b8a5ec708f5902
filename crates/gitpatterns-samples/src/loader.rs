//! CSV loading into typed repository tables.
//!
//! The first column named `repo` or `repo_name` identifies the repository.
//! Every other column is typed through the attribute catalog; columns the
//! catalog does not know are kept as text.

use std::io::Read;
use std::path::Path;

use gitpatterns_core::{AttributeCatalog, ColumnData, PatternsError, RepoTable};
use tracing::{debug, info};

use crate::manifest::SampleManifest;

const ID_COLUMNS: [&str; 2] = ["repo", "repo_name"];

/// A loaded sample batch.
#[derive(Debug, Clone)]
pub struct Sample {
    /// The manifest the batch was loaded from.
    pub manifest: SampleManifest,
    /// Typed repository rows.
    pub table: RepoTable,
}

/// Read a repository CSV file.
///
/// # Errors
///
/// Returns [`PatternsError::FileNotFound`] if `path` does not exist, and
/// any error of [`read_repo_csv_from`].
pub fn read_repo_csv(path: &Path, catalog: &AttributeCatalog) -> Result<RepoTable, PatternsError> {
    if !path.exists() {
        return Err(PatternsError::FileNotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    let table = read_repo_csv_from(file, catalog)
        .map_err(|e| match e {
            PatternsError::Csv(msg) => PatternsError::Csv(format!("{}: {msg}", path.display())),
            other => other,
        })?;
    debug!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "read repository csv"
    );
    Ok(table)
}

/// Read repository rows from any CSV source.
///
/// # Errors
///
/// Returns [`PatternsError::Csv`] on malformed CSV, a missing identifier
/// column, or a cell that does not parse as its catalog type.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::{AttributeCatalog, ColumnData};
/// use gitpatterns_samples::read_repo_csv_from;
///
/// let csv = "repo,pushes,language\nacme/a,3,Go\nacme/b,,Rust\n";
/// let catalog = AttributeCatalog::builtin().unwrap();
/// let table = read_repo_csv_from(csv.as_bytes(), &catalog).unwrap();
/// assert_eq!(table.repos(), &["acme/a".to_string(), "acme/b".to_string()]);
/// assert_eq!(
///     table.column("pushes").unwrap().data,
///     ColumnData::Int(vec![Some(3), None])
/// );
/// ```
pub fn read_repo_csv_from<R: Read>(
    reader: R,
    catalog: &AttributeCatalog,
) -> Result<RepoTable, PatternsError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| PatternsError::Csv(format!("failed to read header: {e}")))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let id = headers
        .iter()
        .position(|h| ID_COLUMNS.contains(&h.as_str()))
        .ok_or_else(|| {
            PatternsError::Csv(format!(
                "missing repository column (expected one of: {})",
                ID_COLUMNS.join(", ")
            ))
        })?;

    let records = rdr
        .records()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| PatternsError::Csv(format!("failed to read record: {e}")))?;

    let repos: Vec<String> = records
        .iter()
        .map(|r| r.get(id).unwrap_or_default().to_string())
        .collect();
    let mut table = RepoTable::new(repos);

    for (i, name) in headers.iter().enumerate() {
        if i == id {
            continue;
        }
        let raw = records.iter().map(|r| r.get(i).unwrap_or_default());
        let data = match catalog.get(name) {
            Some(spec) => spec.convert(raw)?,
            None => ColumnData::Str(
                raw.map(|v| (!v.is_empty()).then(|| v.to_string()))
                    .collect(),
            ),
        };
        table.push_column(name.as_str(), data)?;
    }

    Ok(table)
}

/// Reject tables too small to mine.
///
/// # Errors
///
/// Returns [`PatternsError::EmptyTable`] for zero rows and
/// [`PatternsError::InsufficientRows`] for fewer than `min_rows`.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::{PatternsError, RepoTable};
/// use gitpatterns_samples::check_sample_size;
///
/// let table = RepoTable::new(vec!["a".into(), "b".into()]);
/// assert!(check_sample_size(&table, 2).is_ok());
/// assert!(matches!(
///     check_sample_size(&table, 200),
///     Err(PatternsError::InsufficientRows { rows: 2, min: 200 })
/// ));
/// ```
pub fn check_sample_size(table: &RepoTable, min_rows: usize) -> Result<(), PatternsError> {
    let rows = table.row_count();
    if rows == 0 {
        return Err(PatternsError::EmptyTable("sample has no rows".into()));
    }
    if rows < min_rows {
        return Err(PatternsError::InsufficientRows { rows, min: min_rows });
    }
    Ok(())
}

/// Load a sample batch from its manifest.
///
/// # Errors
///
/// Returns any error of [`SampleManifest::from_file`], [`read_repo_csv`]
/// or [`check_sample_size`].
pub fn load_sample(
    manifest_path: &Path,
    catalog: &AttributeCatalog,
    min_rows: usize,
) -> Result<Sample, PatternsError> {
    let manifest = SampleManifest::from_file(manifest_path)?;
    let table = read_repo_csv(&manifest.data, catalog)?;
    check_sample_size(&table, min_rows)?;
    info!(
        manifest = %manifest_path.display(),
        rows = table.row_count(),
        start = %manifest.start_date,
        end = %manifest.end_date,
        "loaded sample"
    );
    Ok(Sample { manifest, table })
}
