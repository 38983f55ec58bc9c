use std::fmt;

use crate::error::{CountError, Result};

// Labels carry a numeric prefix so that sorting them lexically gives the
// intended column order in the report.
pub const FILENAME_COLUMN: &str = "1. Filename";
pub const ROI_AREA_COLUMN: &str = "2. ROI Area";

pub fn count_column(channel: u32) -> String {
    format!("3. C{channel} cell count")
}

pub fn normalized_column(channel: u32) -> String {
    format!("4. C{channel} normalized count")
}

#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Text(String),
    Count(u64),
    Real(f64),
    Empty,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Count(n) => write!(f, "{n}"),
            Cell::Real(x) => write!(f, "{x}"),
            Cell::Empty => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub label: String,
    pub values: Vec<Cell>,
}

/// Columns in declaration order, each holding one value per processed file.
/// Order for output is only fixed by [`ResultTable::sorted_columns`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultTable {
    columns: Vec<Column>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty column. Returns false if the label already exists.
    pub fn declare(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        if self.is_declared(&label) {
            return false;
        }
        self.columns.push(Column {
            label,
            values: Vec::new(),
        });
        true
    }

    pub fn is_declared(&self, label: &str) -> bool {
        self.columns.iter().any(|c| c.label == label)
    }

    pub fn push(&mut self, label: &str, cell: Cell) -> Result<()> {
        let col = self
            .columns
            .iter_mut()
            .find(|c| c.label == label)
            .ok_or_else(|| CountError::Table(format!("column \"{label}\" was never declared")))?;
        col.values.push(cell);
        Ok(())
    }

    pub fn column(&self, label: &str) -> Option<&[Cell]> {
        self.columns
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.values.as_slice())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// True when no column has been declared.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    /// Every column must hold the same number of values.
    pub fn check_lockstep(&self) -> Result<()> {
        let rows = self.row_count();
        match self.columns.iter().find(|c| c.values.len() != rows) {
            Some(c) => Err(CountError::Table(format!(
                "column \"{}\" has {} value(s), expected {rows}",
                c.label,
                c.values.len()
            ))),
            None => Ok(()),
        }
    }

    pub fn sorted_columns(&self) -> Vec<&Column> {
        let mut cols: Vec<&Column> = self.columns.iter().collect();
        cols.sort_by(|a, b| a.label.cmp(&b.label));
        cols
    }

    pub fn header(&self) -> Vec<&str> {
        self.sorted_columns()
            .into_iter()
            .map(|c| c.label.as_str())
            .collect()
    }

    /// Rows in file order, cells in sorted column order.
    pub fn rows(&self) -> Vec<Vec<&Cell>> {
        let cols = self.sorted_columns();
        (0..self.row_count())
            .map(|i| cols.iter().map(|c| &c.values[i]).collect())
            .collect()
    }
}
