//! Styled XLSX rendering of the joined table.
//!
//! The header row is bold on a dark fill and frozen. When a grouping column
//! is configured and present, every cell of a row takes the fill assigned to
//! that row's grouping value.

use std::collections::HashMap;

use rust_xlsxwriter::{Color, Format, FormatBorder, FormatPattern, Workbook, Worksheet, XlsxError};
use tracing::debug;

use crate::error::AppError;
use crate::report::palette::{assign_row_colors, RowColors};
use crate::table::{Cell, Table};

/// Name of the single worksheet in the export.
pub const SHEET_NAME: &str = "Joined";

/// Header fill (dark blue).
const HEADER_FILL: u32 = 0x1F4E78;

/// Number format for date cells, matching the CSV text form.
const DATETIME_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Column widths are fitted to content up to this many characters.
const MAX_COLUMN_WIDTH: usize = 50;

/// Minimum column width in characters.
const MIN_COLUMN_WIDTH: usize = 8;

/// How a single written cell is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CellStyle {
    Header,
    Body { fill: Option<u32>, date: bool },
}

impl CellStyle {
    fn to_format(self) -> Format {
        match self {
            CellStyle::Header => Format::new()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(HEADER_FILL))
                .set_pattern(FormatPattern::Solid)
                .set_border(FormatBorder::Thin),
            CellStyle::Body { fill, date } => {
                let mut format = Format::new();
                if let Some(rgb) = fill {
                    format = format
                        .set_background_color(Color::RGB(rgb))
                        .set_pattern(FormatPattern::Solid);
                }
                if date {
                    format = format.set_num_format(DATETIME_NUM_FORMAT);
                }
                format
            }
        }
    }
}

/// Styles for every cell of the sheet, header row first.
///
/// Every cell of a body row, blank ones included, takes that row's fill.
fn cell_styles(table: &Table, colors: Option<&RowColors>) -> Vec<Vec<CellStyle>> {
    let header = vec![CellStyle::Header; table.columns().len()];
    let body = table.rows().iter().enumerate().map(|(idx, row)| {
        let fill = colors.and_then(|c| c.rows.get(idx).copied().flatten());
        row.iter()
            .map(|cell| CellStyle::Body {
                fill,
                date: matches!(cell, Cell::DateTime(_)),
            })
            .collect()
    });
    std::iter::once(header).chain(body).collect()
}

/// Renders the table as an XLSX workbook.
///
/// # Arguments
///
/// * `table` - Joined rows to write
/// * `color_by` - Grouping column for row fills; ignored if absent from `table`
/// * `palette` - Fill colors (RGB) cycled over distinct grouping values
///
/// # Errors
///
/// Returns `AppError::Render` if the workbook cannot be produced, e.g. when
/// the table exceeds the worksheet row or column limit.
pub fn render_spreadsheet(
    table: &Table,
    color_by: Option<&str>,
    palette: &[u32],
) -> Result<Vec<u8>, AppError> {
    let colors = color_by.and_then(|column| assign_row_colors(table, column, palette));
    if let Some(colors) = &colors {
        debug!(
            "[XLSX] Coloring rows by {} distinct values",
            colors.legend.len()
        );
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME).map_err(render_err)?;

    let styles = cell_styles(table, colors.as_ref());
    let mut formats: HashMap<CellStyle, Format> = HashMap::new();

    for (col, name) in table.columns().iter().enumerate() {
        let format = formats
            .entry(CellStyle::Header)
            .or_insert_with(|| CellStyle::Header.to_format());
        sheet
            .write_string_with_format(0, col_num(col)?, name, format)
            .map_err(render_err)?;
    }

    for (idx, (row, row_styles)) in table.rows().iter().zip(styles.iter().skip(1)).enumerate() {
        let row_num = u32::try_from(idx + 1).map_err(|_| AppError::Render {
            format: "XLSX".into(),
            message: "too many rows".into(),
        })?;
        for (col, (cell, style)) in row.iter().zip(row_styles).enumerate() {
            let format = formats.entry(*style).or_insert_with(|| style.to_format());
            write_cell(sheet, row_num, col_num(col)?, cell, format).map_err(render_err)?;
        }
    }

    sheet.set_freeze_panes(1, 0).map_err(render_err)?;
    for (col, width) in column_widths(table).into_iter().enumerate() {
        sheet
            .set_column_width(col_num(col)?, width as f64)
            .map_err(render_err)?;
    }

    workbook.save_to_buffer().map_err(render_err)
}

fn col_num(col: usize) -> Result<u16, AppError> {
    u16::try_from(col).map_err(|_| AppError::Render {
        format: "XLSX".into(),
        message: "too many columns".into(),
    })
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    format: &Format,
) -> Result<(), XlsxError> {
    match cell {
        Cell::Empty => sheet.write_blank(row, col, format)?,
        Cell::Text(s) => sheet.write_string_with_format(row, col, s, format)?,
        Cell::Int(i) => sheet.write_number_with_format(row, col, *i as f64, format)?,
        Cell::Float(f) => sheet.write_number_with_format(row, col, *f, format)?,
        Cell::Bool(b) => sheet.write_boolean_with_format(row, col, *b, format)?,
        Cell::DateTime(dt) => sheet.write_datetime_with_format(row, col, dt, format)?,
    };
    Ok(())
}

/// Character widths per column, fitted to the longest value.
fn column_widths(table: &Table) -> Vec<usize> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let longest = table
                .rows()
                .iter()
                .map(|row| row[col].to_string().chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0);
            (longest + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
        })
        .collect()
}

fn render_err(err: XlsxError) -> AppError {
    AppError::Render {
        format: "XLSX".into(),
        message: err.to_string(),
    }
}
