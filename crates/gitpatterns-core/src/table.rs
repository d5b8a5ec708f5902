//! Column-oriented repository table.
//!
//! A [`RepoTable`] is a list of repository names plus an arena of named,
//! typed column vectors. Every cell is optional; a missing value is a null.

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};

use crate::error::PatternsError;

/// Values of one column.
///
/// `Rank` columns only appear after quantile discretization.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Integer values.
    Int(Vec<Option<i64>>),
    /// Floating point values.
    Float(Vec<Option<f64>>),
    /// Text values.
    Str(Vec<Option<String>>),
    /// Boolean flags.
    Bool(Vec<Option<bool>>),
    /// Quantile ranks, 1 = top bucket.
    Rank(Vec<Option<u32>>),
}

/// Borrowed view of a single cell.
///
/// Floats compare and hash by bit pattern so rows can be deduplicated exactly.
#[derive(Debug, Clone, Copy)]
pub enum Cell<'a> {
    /// Missing value.
    Null,
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Str(&'a str),
    /// Boolean value.
    Bool(bool),
    /// Quantile rank.
    Rank(u32),
}

impl Cell<'_> {
    /// Whether the cell is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Whether the cell is a numeric zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Cell::Int(v) => *v == 0,
            Cell::Float(v) => *v == 0.0,
            _ => false,
        }
    }
}

impl PartialEq for Cell<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Null, Cell::Null) => true,
            (Cell::Int(a), Cell::Int(b)) => a == b,
            (Cell::Float(a), Cell::Float(b)) => a.to_bits() == b.to_bits(),
            (Cell::Str(a), Cell::Str(b)) => a == b,
            (Cell::Bool(a), Cell::Bool(b)) => a == b,
            (Cell::Rank(a), Cell::Rank(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Cell<'_> {}

impl Hash for Cell<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Cell::Null => {}
            Cell::Int(v) => v.hash(state),
            Cell::Float(v) => v.to_bits().hash(state),
            Cell::Str(v) => v.hash(state),
            Cell::Bool(v) => v.hash(state),
            Cell::Rank(v) => v.hash(state),
        }
    }
}

impl ColumnData {
    /// Number of cells.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Str(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
            ColumnData::Rank(v) => v.len(),
        }
    }

    /// Whether the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Storage type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnData::Int(_) => "int",
            ColumnData::Float(_) => "float",
            ColumnData::Str(_) => "str",
            ColumnData::Bool(_) => "bool",
            ColumnData::Rank(_) => "rank",
        }
    }

    /// Cell at `row`; out-of-range rows read as null.
    pub fn cell(&self, row: usize) -> Cell<'_> {
        let cell = match self {
            ColumnData::Int(v) => v.get(row).copied().flatten().map(Cell::Int),
            ColumnData::Float(v) => v.get(row).copied().flatten().map(Cell::Float),
            ColumnData::Str(v) => v.get(row).and_then(|s| s.as_deref()).map(Cell::Str),
            ColumnData::Bool(v) => v.get(row).copied().flatten().map(Cell::Bool),
            ColumnData::Rank(v) => v.get(row).copied().flatten().map(Cell::Rank),
        };
        cell.unwrap_or(Cell::Null)
    }

    /// Iterate over all cells.
    pub fn cells(&self) -> impl Iterator<Item = Cell<'_>> {
        (0..self.len()).map(move |row| self.cell(row))
    }

    /// Numeric view of an int or float column; `None` for other types.
    pub fn as_f64(&self) -> Option<Vec<Option<f64>>> {
        match self {
            ColumnData::Int(v) => Some(v.iter().map(|x| x.map(|x| x as f64)).collect()),
            ColumnData::Float(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// A new column holding the cells at `rows`, in that order.
    pub fn take(&self, rows: &[usize]) -> Self {
        fn pick<T: Clone>(values: &[Option<T>], rows: &[usize]) -> Vec<Option<T>> {
            rows.iter()
                .map(|&r| values.get(r).cloned().flatten())
                .collect()
        }
        match self {
            ColumnData::Int(v) => ColumnData::Int(pick(v, rows)),
            ColumnData::Float(v) => ColumnData::Float(pick(v, rows)),
            ColumnData::Str(v) => ColumnData::Str(pick(v, rows)),
            ColumnData::Bool(v) => ColumnData::Bool(pick(v, rows)),
            ColumnData::Rank(v) => ColumnData::Rank(pick(v, rows)),
        }
    }

    /// Append `other` to this column.
    ///
    /// Integer columns widen to float when the other side is float.
    ///
    /// # Errors
    ///
    /// Returns [`PatternsError::Config`] when the storage types cannot be combined.
    pub fn extend_from(&mut self, other: &ColumnData) -> Result<(), PatternsError> {
        let widened = match (&*self, other) {
            (ColumnData::Int(mine), ColumnData::Float(_)) => Some(ColumnData::Float(
                mine.iter().map(|v| v.map(|x| x as f64)).collect(),
            )),
            _ => None,
        };
        if let Some(widened) = widened {
            *self = widened;
        }
        match (self, other) {
            (ColumnData::Int(a), ColumnData::Int(b)) => a.extend_from_slice(b),
            (ColumnData::Float(a), ColumnData::Float(b)) => a.extend_from_slice(b),
            (ColumnData::Float(a), ColumnData::Int(b)) => {
                a.extend(b.iter().map(|v| v.map(|x| x as f64)))
            }
            (ColumnData::Str(a), ColumnData::Str(b)) => a.extend_from_slice(b),
            (ColumnData::Bool(a), ColumnData::Bool(b)) => a.extend_from_slice(b),
            (ColumnData::Rank(a), ColumnData::Rank(b)) => a.extend_from_slice(b),
            (a, b) => {
                return Err(PatternsError::Config(format!(
                    "cannot combine {} column with {} column",
                    a.type_name(),
                    b.type_name()
                )))
            }
        }
        Ok(())
    }

    fn push_nulls(&mut self, count: usize) {
        match self {
            ColumnData::Int(v) => v.extend(std::iter::repeat(None).take(count)),
            ColumnData::Float(v) => v.extend(std::iter::repeat(None).take(count)),
            ColumnData::Str(v) => v.extend(std::iter::repeat(None).take(count)),
            ColumnData::Bool(v) => v.extend(std::iter::repeat(None).take(count)),
            ColumnData::Rank(v) => v.extend(std::iter::repeat(None).take(count)),
        }
    }

    fn empty_like(&self) -> Self {
        match self {
            ColumnData::Int(_) => ColumnData::Int(Vec::new()),
            ColumnData::Float(_) => ColumnData::Float(Vec::new()),
            ColumnData::Str(_) => ColumnData::Str(Vec::new()),
            ColumnData::Bool(_) => ColumnData::Bool(Vec::new()),
            ColumnData::Rank(_) => ColumnData::Rank(Vec::new()),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Attribute name.
    pub name: String,
    /// Cell values, one per table row.
    pub data: ColumnData,
}

/// A rectangular table of repository records.
///
/// # Examples
///
/// ```
/// use gitpatterns_core::{ColumnData, RepoTable};
///
/// let table = RepoTable::new(vec!["a/x".into(), "b/y".into()])
///     .with_column("pushes", ColumnData::Int(vec![Some(3), None]))
///     .unwrap();
/// assert_eq!(table.row_count(), 2);
/// assert!(table.column("pushes").is_some());
/// assert!(table.column("forks").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepoTable {
    repos: Vec<String>,
    columns: Vec<Column>,
}

impl RepoTable {
    /// Create a table with the given repository names and no columns.
    pub fn new(repos: Vec<String>) -> Self {
        Self {
            repos,
            columns: Vec::new(),
        }
    }

    /// Builder form of [`RepoTable::push_column`].
    ///
    /// # Errors
    ///
    /// See [`RepoTable::push_column`].
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        data: ColumnData,
    ) -> Result<Self, PatternsError> {
        self.push_column(name, data)?;
        Ok(self)
    }

    /// Append a column.
    ///
    /// # Errors
    ///
    /// Returns [`PatternsError::Config`] if the column length differs from
    /// the row count or the name is already taken.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        data: ColumnData,
    ) -> Result<(), PatternsError> {
        let name = name.into();
        if data.len() != self.repos.len() {
            return Err(PatternsError::Config(format!(
                "column '{name}' has {} values, table has {} rows",
                data.len(),
                self.repos.len()
            )));
        }
        if self.column(&name).is_some() {
            return Err(PatternsError::Config(format!("duplicate column '{name}'")));
        }
        self.columns.push(Column { name, data });
        Ok(())
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.repos.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    /// Repository names, one per row.
    pub fn repos(&self) -> &[String] {
        &self.repos
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column named `name`, if present.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// A copy keeping only the columns for which `keep` returns `true`.
    pub fn retain_columns(&self, mut keep: impl FnMut(&Column) -> bool) -> Self {
        Self {
            repos: self.repos.clone(),
            columns: self.columns.iter().filter(|c| keep(c)).cloned().collect(),
        }
    }

    /// A copy with every column passed through `map`.
    pub fn map_columns(&self, mut map: impl FnMut(&Column) -> ColumnData) -> Self {
        Self {
            repos: self.repos.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: map(c),
                })
                .collect(),
        }
    }

    /// A copy holding only the rows at `rows`, in that order.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            repos: rows
                .iter()
                .filter_map(|&r| self.repos.get(r).cloned())
                .collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.take(rows),
                })
                .collect(),
        }
    }

    /// Indices of the first occurrence of every distinct row.
    ///
    /// Two rows are equal when the repository name and every cell match.
    pub fn distinct_rows(&self) -> Vec<usize> {
        let mut seen: HashSet<(&str, Vec<Cell<'_>>)> = HashSet::with_capacity(self.repos.len());
        (0..self.repos.len())
            .filter(|&row| {
                let key: (&str, Vec<Cell<'_>>) = (
                    self.repos[row].as_str(),
                    self.columns.iter().map(|c| c.data.cell(row)).collect(),
                );
                seen.insert(key)
            })
            .collect()
    }

    /// Stack tables vertically.
    ///
    /// The result has the union of all columns in first-seen order; cells of
    /// columns a table lacks are null.
    ///
    /// # Errors
    ///
    /// Returns [`PatternsError::Config`] when the same column has
    /// incompatible types in two tables.
    ///
    /// # Examples
    ///
    /// ```
    /// use gitpatterns_core::{ColumnData, RepoTable};
    ///
    /// let a = RepoTable::new(vec!["a".into()])
    ///     .with_column("forks", ColumnData::Int(vec![Some(1)]))
    ///     .unwrap();
    /// let b = RepoTable::new(vec!["b".into()])
    ///     .with_column("issues", ColumnData::Int(vec![Some(2)]))
    ///     .unwrap();
    /// let merged = RepoTable::concat(&[a, b]).unwrap();
    /// assert_eq!(merged.row_count(), 2);
    /// assert_eq!(
    ///     merged.column("forks").unwrap().data,
    ///     ColumnData::Int(vec![Some(1), None])
    /// );
    /// ```
    pub fn concat(tables: &[RepoTable]) -> Result<Self, PatternsError> {
        let mut repos = Vec::new();
        let mut columns: Vec<Column> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for table in tables {
            let offset = repos.len();
            for column in &table.columns {
                let pos = *positions.entry(column.name.clone()).or_insert_with(|| {
                    let mut data = column.data.empty_like();
                    data.push_nulls(offset);
                    columns.push(Column {
                        name: column.name.clone(),
                        data,
                    });
                    columns.len() - 1
                });
                columns[pos]
                    .data
                    .extend_from(&column.data)
                    .map_err(|e| match e {
                        PatternsError::Config(msg) => {
                            PatternsError::Config(format!("column '{}': {msg}", column.name))
                        }
                        other => other,
                    })?;
            }
            repos.extend(table.repos.iter().cloned());
            let total = repos.len();
            for column in &mut columns {
                let missing = total - column.data.len();
                column.data.push_nulls(missing);
            }
        }

        Ok(Self { repos, columns })
    }
}
