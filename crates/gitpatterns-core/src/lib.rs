//! Core types, configuration, and error handling for gitpatterns.
//!
//! This crate provides the shared foundation used by all other gitpatterns crates:
//! - [`PatternsError`]: unified error type using `thiserror`
//! - [`PatternsConfig`]: configuration loaded from `.gitpatterns.toml`
//! - [`AttributeCatalog`]: the static attribute configuration table
//! - [`RepoTable`] and [`TransactionMatrix`]: the tabular data flowing through the pipeline
//! - Shared enums: [`Division`], [`Locale`], [`ConditionKind`], [`OutputFormat`]

mod attributes;
mod config;
mod error;
mod matrix;
mod table;
mod types;

pub use attributes::{AttributeCatalog, AttributeSpec, DataSource, Dtype};
pub use config::{AttributesConfig, MiningParams, PatternsConfig, SampleConfig};
pub use error::PatternsError;
pub use matrix::TransactionMatrix;
pub use table::{Cell, Column, ColumnData, RepoTable};
pub use types::{ConditionKind, Division, Locale, OutputFormat, QuantileConfig};

/// A convenience `Result` type for gitpatterns operations.
pub type Result<T> = std::result::Result<T, PatternsError>;
