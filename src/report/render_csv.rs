//! Plain CSV rendering of the joined table.

use csv::{Terminator, WriterBuilder};

use crate::error::AppError;
use crate::table::Table;

/// Renders the table as UTF-8 CSV: header row, then one line per record.
///
/// # Errors
///
/// Returns `AppError::Render` if the CSV writer fails.
pub fn render_csv(table: &Table) -> Result<Vec<u8>, AppError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(table.columns()).map_err(render_err)?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(ToString::to_string))
            .map_err(render_err)?;
    }

    writer.into_inner().map_err(|e| AppError::Render {
        format: "CSV".into(),
        message: e.error().to_string(),
    })
}

fn render_err(err: csv::Error) -> AppError {
    AppError::Render {
        format: "CSV".into(),
        message: err.to_string(),
    }
}
