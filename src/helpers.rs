//! Helper utilities for testing and development.

use std::sync::Arc;

use crate::results::{DbRow, ResultSet};
use crate::types::RowValues;

/// Create a test row with the given column names and values.
#[must_use]
pub fn create_test_row(column_names: Vec<String>, values: Vec<RowValues>) -> DbRow {
    DbRow::new(Arc::new(column_names), values)
}

/// Create a result set from column names and positional rows.
#[must_use]
pub fn create_test_result_set(column_names: &[&str], rows: Vec<Vec<RowValues>>) -> ResultSet {
    let names = column_names.iter().map(|name| (*name).to_string()).collect();
    let mut result_set = ResultSet::with_capacity(names, rows.len());
    for row in rows {
        result_set.add_row_values(row);
    }
    result_set
}
