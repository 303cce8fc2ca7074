//! Spreadsheet decoding into a `Table`.
//!
//! Reads the first worksheet of an xlsx/xls/ods workbook held in memory. The
//! first row of the used range is the header; fully blank rows are skipped.
//! Date-formatted cells keep their type as `Cell::DateTime`.

use std::fmt::Display;
use std::io::{Cursor, Read, Seek};

use calamine::{open_workbook_auto_from_rs, Data, DataType, Range, Reader, Xls, Xlsx};

use crate::error::AppError;
use crate::table::{Cell, Table};

/// Workbook container to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetKind {
    /// Office Open XML (`.xlsx`).
    Xlsx,
    /// Legacy binary workbook (`.xls`).
    Xls,
    /// Sniff the container from its content.
    Auto,
}

/// Parses workbook bytes into a table.
///
/// # Errors
///
/// Returns `AppError::Parse` if the bytes are not a readable workbook of the
/// requested kind or the workbook has no worksheets.
pub fn parse_spreadsheet(bytes: &[u8], kind: SpreadsheetKind) -> Result<Table, AppError> {
    let cursor = Cursor::new(bytes);

    let range = match kind {
        SpreadsheetKind::Xlsx => {
            let mut workbook: Xlsx<_> = Xlsx::new(cursor).map_err(parse_err)?;
            first_sheet(&mut workbook)?
        }
        SpreadsheetKind::Xls => {
            let mut workbook: Xls<_> = Xls::new(cursor).map_err(parse_err)?;
            first_sheet(&mut workbook)?
        }
        SpreadsheetKind::Auto => {
            let mut workbook = open_workbook_auto_from_rs(cursor).map_err(parse_err)?;
            first_sheet(&mut workbook)?
        }
    };

    range_to_table(&range)
}

fn parse_err(err: impl Display) -> AppError {
    AppError::Parse(err.to_string())
}

/// Returns the used range of the first worksheet.
fn first_sheet<R, RS>(workbook: &mut R) -> Result<Range<Data>, AppError>
where
    R: Reader<RS>,
    RS: Read + Seek,
    R::Error: Display,
{
    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Parse("workbook contains no worksheets".into()))?
        .map_err(parse_err)
}

fn range_to_table(range: &Range<Data>) -> Result<Table, AppError> {
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|d| data_to_cell(d).to_string())
            .collect(),
        None => return Ok(Table::default()),
    };

    let body: Vec<Vec<Cell>> = rows
        .map(|row| row.iter().map(data_to_cell).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .collect();

    Table::from_raw(headers, body)
}

/// Converts a calamine value into a `Cell`.
fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::from_text(s),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        // Durations have no calendar date; keep them as day fractions.
        Data::DateTime(dt) if dt.is_duration() => Cell::Float(dt.as_f64()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Cell::DateTime)
            .unwrap_or_else(|| Cell::Float(dt.as_f64())),
        Data::DateTimeIso(s) => data
            .as_datetime()
            .map(Cell::DateTime)
            .unwrap_or_else(|| Cell::from_text(s)),
        Data::DurationIso(s) => Cell::from_text(s),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}
