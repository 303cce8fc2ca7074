//! In-memory tabular data shared by the loader, the join engine and the renderers.
//!
//! A `Table` is a list of column names plus row-major cells. Every row has
//! exactly as many cells as there are columns.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// Cell
// ─────────────────────────────────────────────────────────────────────────────

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Spreadsheet date or timestamp.
    DateTime(NaiveDateTime),
}

/// Text form of `Cell::DateTime` in previews and CSV output.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl Cell {
    /// Builds a cell from raw text, treating the empty string as `Empty`.
    pub fn from_text(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Returns the value as a join key, or `None` for empty cells.
    pub fn as_key(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }

    /// Total order used for sorting: numbers, then dates, then booleans, then
    /// text; empty last.
    pub fn sort_cmp(&self, other: &Cell) -> Ordering {
        fn rank(cell: &Cell) -> u8 {
            match cell {
                Cell::Int(_) | Cell::Float(_) => 0,
                Cell::DateTime(_) => 1,
                Cell::Bool(_) => 2,
                Cell::Text(s) if !s.is_empty() => 3,
                _ => 4,
            }
        }

        match (self, other) {
            (Cell::Int(a), Cell::Int(b)) => a.cmp(b),
            (Cell::Int(_) | Cell::Float(_), Cell::Int(_) | Cell::Float(_)) => {
                let a = self.as_f64().unwrap_or(0.0);
                let b = other.as_f64().unwrap_or(0.0);
                a.total_cmp(&b)
            }
            (Cell::DateTime(a), Cell::DateTime(b)) => a.cmp(b),
            (Cell::Bool(a), Cell::Bool(b)) => a.cmp(b),
            (Cell::Text(a), Cell::Text(b)) if !a.is_empty() && !b.is_empty() => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Bool(b) => f.write_str(if *b { "True" } else { "False" }),
            Cell::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Table
// ─────────────────────────────────────────────────────────────────────────────

/// Column names plus row-major cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Creates an empty table with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from raw header names and rows.
    ///
    /// Headers are normalized (blank names become `Unnamed: <index>`, repeats
    /// become `Name.1`, `Name.2`, ...). Short rows are padded with `Empty`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::CsvInvalid` if a row has more cells than there are headers.
    pub fn from_raw(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, AppError> {
        let columns = normalize_headers(headers);
        let width = columns.len();
        let mut table = Table::new(columns);

        for (idx, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(AppError::CsvInvalid(format!(
                    "row {} has {} fields, expected at most {}",
                    idx + 2,
                    row.len(),
                    width
                )));
            }
            row.resize(width, Cell::Empty);
            table.rows.push(row);
        }

        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the index of the named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Returns the index of a column that must exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MissingColumn` naming `table_label` when absent.
    pub fn require_column(&self, name: &str, table_label: &str) -> Result<usize, AppError> {
        self.column_index(name).ok_or_else(|| AppError::MissingColumn {
            table: table_label.to_string(),
            column: name.to_string(),
        })
    }

    /// Returns the cell at `row`/`column` by column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Appends a row, padding or rejecting it to match the column count.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the row is wider than the table.
    pub fn push_row(&mut self, mut row: Vec<Cell>) -> Result<(), AppError> {
        if row.len() > self.columns.len() {
            return Err(AppError::Internal(format!(
                "row has {} cells but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
        Ok(())
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Vec<Cell>> {
        &mut self.rows
    }

    /// Returns the first `limit` rows rendered as strings.
    pub fn preview(&self, limit: usize) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .take(limit)
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect()
    }
}

/// Normalizes header names the way spreadsheet readers do.
fn normalize_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(headers.len());

    for (idx, raw) in headers.into_iter().enumerate() {
        let trimmed = raw.trim();
        let base = if trimmed.is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            trimmed.to_string()
        };

        let name = match seen.get(&base).copied() {
            None => base.clone(),
            Some(mut n) => {
                let mut candidate = format!("{}.{}", base, n);
                while seen.contains_key(&candidate) {
                    n += 1;
                    candidate = format!("{}.{}", base, n);
                }
                seen.insert(base.clone(), n + 1);
                candidate
            }
        };

        seen.entry(base).or_insert(1);
        seen.insert(name.clone(), 1);
        out.push(name);
    }

    out
}
