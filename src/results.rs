use std::collections::HashMap;
use std::sync::Arc;

use crate::error::FieldReadError;
use crate::field::{FromField, read_field};
use crate::types::RowValues;

type ColumnIndex = Arc<HashMap<String, usize>>;

fn build_column_index(column_names: &[String]) -> ColumnIndex {
    let mut index = HashMap::with_capacity(column_names.len());
    for (i, name) in column_names.iter().enumerate() {
        // Duplicate names resolve to the first occurrence.
        index.entry(name.clone()).or_insert(i);
    }
    Arc::new(index)
}

/// A row from a database query result
///
/// Column names and the name lookup table are shared by every row of the
/// result set the row came from.
#[derive(Debug, Clone)]
pub struct DbRow {
    column_names: Arc<Vec<String>>,
    values: Vec<RowValues>,
    column_index: ColumnIndex,
}

impl DbRow {
    /// Create a new database row
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<RowValues>) -> Self {
        let column_index = build_column_index(&column_names);
        Self {
            column_names,
            values,
            column_index,
        }
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn values(&self) -> &[RowValues] {
        &self.values
    }

    /// Get the index of a column by name
    ///
    /// Exact matches win; otherwise the first column whose name matches
    /// ignoring ASCII case is used, as SQL Server identifiers are usually
    /// case-insensitive.
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        if let Some(&idx) = self.column_index.get(column_name) {
            return Some(idx);
        }

        self.column_names
            .iter()
            .position(|col| col.eq_ignore_ascii_case(column_name))
    }

    /// Get a value from the row by column name
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the row by column index
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }

    /// Read the named column as `T`, applying the field read policy.
    ///
    /// # Errors
    ///
    /// Returns a [`FieldReadError`] when the column is missing, NULL for a
    /// non-nullable `T`, not a defined enum member, or not convertible.
    pub fn read<T: FromField>(&self, field: &str) -> Result<T, FieldReadError> {
        read_field(self, field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<RowValues> {
        self.values
    }
}

/// A result set from a database query
///
/// Only the first result set of a batch is kept.
#[derive(Debug, Clone)]
pub struct ResultSet {
    column_names: Arc<Vec<String>>,
    column_index: ColumnIndex,
    rows: Vec<DbRow>,
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ResultSet {
    #[must_use]
    pub fn new(column_names: Vec<String>) -> Self {
        Self::with_capacity(column_names, 0)
    }

    /// Create a new result set with a known row capacity
    #[must_use]
    pub fn with_capacity(column_names: Vec<String>, capacity: usize) -> Self {
        let column_index = build_column_index(&column_names);
        Self {
            column_names: Arc::new(column_names),
            column_index,
            rows: Vec::with_capacity(capacity),
        }
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Add a row; the values are positional against the column names.
    pub fn add_row_values(&mut self, values: Vec<RowValues>) {
        self.rows.push(DbRow {
            column_names: Arc::clone(&self.column_names),
            values,
            column_index: Arc::clone(&self.column_index),
        });
    }

    #[must_use]
    pub fn rows(&self) -> &[DbRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<DbRow> {
        self.rows
    }

    #[must_use]
    pub fn first(&self) -> Option<&DbRow> {
        self.rows.first()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
