//! Attachment tables
//!
//! Cells are stored sparsely per column, so removing a cell leaves every
//! other cell of the row and column in place.

use std::collections::{BTreeMap, HashMap, HashSet};

/// Lexical type of a cell value, inferred on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Integer,
    Real,
    Text,
}

impl CellKind {
    /// Infer the kind from a cell's lexical form
    pub fn infer(value: &str) -> Self {
        let value = value.trim();
        if value.parse::<i64>().is_ok() {
            CellKind::Integer
        } else if value.parse::<f64>().is_ok_and(f64::is_finite) {
            CellKind::Real
        } else {
            CellKind::Text
        }
    }
}

/// A borrowed cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell<'a> {
    pub column: &'a str,
    pub row: usize,
    pub value: &'a str,
}

impl Cell<'_> {
    pub fn kind(&self) -> CellKind {
        CellKind::infer(self.value)
    }
}

/// Named columns by zero-based rows
#[derive(Debug, Clone, Default)]
pub struct Table {
    /// Column names in header order
    columns: Vec<String>,
    cells: HashMap<String, BTreeMap<usize, String>>,
    row_count: usize,
    /// Accession of the owning attachment
    attachment: Option<String>,
}

impl Table {
    /// Create an empty table with the given columns
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Table::default();
        for column in columns {
            table.add_column(column);
        }
        table
    }

    /// Column names in header order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// One past the highest row index ever written
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Add a column; returns false if it already exists
    pub fn add_column(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.cells.contains_key(&name) {
            return false;
        }
        self.cells.insert(name.clone(), BTreeMap::new());
        self.columns.push(name);
        true
    }

    /// Append a row, assigning values to columns in header order
    ///
    /// Values beyond the last column are dropped.
    pub fn push_row<I, S>(&mut self, values: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row = self.row_count;
        let columns = self.columns.clone();
        for (column, value) in columns.iter().zip(values) {
            self.set_cell(column, row, value);
        }
        self.row_count = row + 1;
        row
    }

    /// Set a cell, adding the column if needed; returns the previous value
    pub fn set_cell(&mut self, column: &str, row: usize, value: impl Into<String>) -> Option<String> {
        if !self.cells.contains_key(column) {
            self.add_column(column);
        }
        self.row_count = self.row_count.max(row + 1);
        self.cells
            .get_mut(column)
            .and_then(|rows| rows.insert(row, value.into()))
    }

    /// Value of a cell
    pub fn get(&self, column: &str, row: usize) -> Option<&str> {
        self.cells.get(column)?.get(&row).map(String::as_str)
    }

    /// A cell with its position
    pub fn cell<'a>(&'a self, column: &'a str, row: usize) -> Option<Cell<'a>> {
        self.get(column, row).map(|value| Cell { column, row, value })
    }

    /// Remove a single cell; returns its value
    pub fn remove_cell(&mut self, column: &str, row: usize) -> Option<String> {
        self.cells.get_mut(column)?.remove(&row)
    }

    /// Cells of one row in header order; missing cells are `None`
    pub fn row(&self, row: usize) -> Vec<Option<&str>> {
        self.columns.iter().map(|c| self.get(c, row)).collect()
    }

    /// Number of cells actually present
    pub fn cell_count(&self) -> usize {
        self.cells.values().map(BTreeMap::len).sum()
    }

    /// Accession of the attachment owning this table
    pub fn attachment(&self) -> Option<&str> {
        self.attachment.as_deref()
    }

    pub(crate) fn set_attachment(&mut self, accession: Option<String>) {
        self.attachment = accession;
    }
}

/// Tables are equal when they hold the same cells under the same column
/// names, whatever the column order.
impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        let ours: HashSet<&String> = self.columns.iter().collect();
        let theirs: HashSet<&String> = other.columns.iter().collect();
        ours == theirs && self.row_count == other.row_count && self.cells == other.cells
    }
}
