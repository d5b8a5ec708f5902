//! Sample batches: manifests, CSV loading, and merging.
//!
//! A sample is one acquisition batch of repository records exported as CSV,
//! described by a TOML manifest that records the date range, the acquisition
//! filters and the attribute divisions the batch was collected with. Batches
//! are merged into one mining session only when their divisions agree.

pub mod loader;
pub mod manifest;
pub mod merge;

pub use loader::{check_sample_size, load_sample, read_repo_csv, read_repo_csv_from, Sample};
pub use manifest::SampleManifest;
pub use merge::merge_samples;
