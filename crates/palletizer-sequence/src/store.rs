//! Sequence row store
//!
//! Ordered collection of rows being edited or executed. Operations that fail
//! leave the store untouched.

use crate::row::Row;
use palletizer_core::SequenceError;

/// Ordered list of sequence rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowStore {
    rows: Vec<Row>,
}

impl RowStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given rows
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the store holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every row, in order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Row at an index
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Row at an index for editing, or an error naming the index
    pub fn load_row(&self, index: usize) -> Result<&Row, SequenceError> {
        self.rows.get(index).ok_or(SequenceError::InvalidIndex {
            index,
            len: self.rows.len(),
        })
    }

    /// Append a row, returning its index
    pub fn add_row(&mut self, row: Row) -> Result<usize, SequenceError> {
        if row.is_empty() {
            return Err(SequenceError::EmptySequence);
        }
        self.rows.push(row);
        tracing::debug!("Row {} added", self.rows.len());
        Ok(self.rows.len() - 1)
    }

    /// Replace the row at an index
    pub fn update_row(&mut self, index: usize, row: Row) -> Result<(), SequenceError> {
        self.check_index(index)?;
        if row.is_empty() {
            return Err(SequenceError::EmptySequence);
        }
        self.rows[index] = row;
        tracing::debug!("Row {} updated", index + 1);
        Ok(())
    }

    /// Remove the row at an index
    pub fn delete_row(&mut self, index: usize) -> Result<Row, SequenceError> {
        self.check_index(index)?;
        tracing::debug!("Row {} deleted", index + 1);
        Ok(self.rows.remove(index))
    }

    /// Remove every row
    pub fn clear_all(&mut self) {
        self.rows.clear();
    }

    /// Swap in a whole new list of rows
    pub fn replace_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
    }

    /// Composite command of a row, empty when the index is out of range
    pub fn get_row_command(&self, index: usize) -> String {
        self.rows.get(index).map(Row::command).unwrap_or_default()
    }

    /// `Row N: <command>` line for one row
    pub fn row_text(&self, index: usize) -> Option<String> {
        self.rows
            .get(index)
            .map(|row| format!("Row {}: {}", index + 1, row.command()))
    }

    /// One `Row N: <command>` line per row
    pub fn describe(&self) -> String {
        (0..self.rows.len())
            .filter_map(|index| self.row_text(index))
            .map(|line| line + "\n")
            .collect()
    }

    fn check_index(&self, index: usize) -> Result<(), SequenceError> {
        if index < self.rows.len() {
            Ok(())
        } else {
            Err(SequenceError::InvalidIndex {
                index,
                len: self.rows.len(),
            })
        }
    }
}
