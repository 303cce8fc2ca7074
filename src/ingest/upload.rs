//! Loading of the operator's uploaded non-delivery list.
//!
//! The file extension decides the parser. CSV uploads are validated first and
//! parsed as text; spreadsheet uploads go through calamine.

use std::path::Path;

use tracing::{debug, info};

use crate::error::AppError;
use crate::ingest::spreadsheet::{parse_spreadsheet, SpreadsheetKind};
use crate::table::{Cell, Table};
use crate::validation::{self, csv_validator::strip_bom};

/// Label used in errors about the uploaded table.
pub const UPLOAD_TABLE_LABEL: &str = "uploaded file";

/// Upload formats recognized by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Xlsx,
    Xls,
}

impl UploadFormat {
    /// Picks the format from the file name's extension (case-insensitive).
    /// A bare name such as `.csv` counts as its extension.
    ///
    /// # Errors
    ///
    /// Returns `AppError::UnsupportedFormat` for any other extension.
    pub fn from_file_name(file_name: &str) -> Result<Self, AppError> {
        let base = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(file_name);
        let ext = base
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match ext.as_deref() {
            Some("csv") => Ok(UploadFormat::Csv),
            Some("xlsx") => Ok(UploadFormat::Xlsx),
            Some("xls") => Ok(UploadFormat::Xls),
            _ => Err(AppError::UnsupportedFormat {
                file_name: file_name.to_string(),
            }),
        }
    }
}

/// Parses an uploaded file into a table.
///
/// # Arguments
///
/// * `bytes` - Raw upload contents
/// * `file_name` - Name of the upload; its extension selects the parser
///
/// # Errors
///
/// - `AppError::UnsupportedFormat` if the extension is not `.csv`, `.xlsx` or `.xls`
/// - `AppError::NotUtf8` / `AppError::CsvInvalid` for malformed CSV uploads
/// - `AppError::Parse` for unreadable spreadsheets
pub fn load_uploaded(bytes: &[u8], file_name: &str) -> Result<Table, AppError> {
    let format = UploadFormat::from_file_name(file_name)?;

    info!(
        "[UPLOAD] Loading {} ({} bytes) as {:?}",
        file_name,
        bytes.len(),
        format
    );

    let table = match format {
        UploadFormat::Csv => parse_csv(bytes)?,
        UploadFormat::Xlsx => parse_spreadsheet(bytes, SpreadsheetKind::Xlsx)?,
        UploadFormat::Xls => parse_spreadsheet(bytes, SpreadsheetKind::Xls)?,
    };

    debug!(
        "[UPLOAD] Parsed {} rows with columns {:?}",
        table.len(),
        table.columns()
    );

    Ok(table)
}

/// Validates and parses CSV bytes. Every value is kept as text.
fn parse_csv(bytes: &[u8]) -> Result<Table, AppError> {
    let report = validation::validate(bytes).into_result()?;
    for warning in &report.warnings {
        debug!("[UPLOAD] CSV warning: {:?}", warning);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(strip_bom(bytes));

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: Vec<Cell> = record.iter().map(Cell::from_text).collect();
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        rows.push(row);
    }

    Table::from_raw(headers, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::spreadsheet::tests::xlsx_bytes;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(UploadFormat::from_file_name("bounces.csv").ok(), Some(UploadFormat::Csv));
        assert_eq!(UploadFormat::from_file_name("Bounces.XLSX").ok(), Some(UploadFormat::Xlsx));
        assert_eq!(UploadFormat::from_file_name("old.xls").ok(), Some(UploadFormat::Xls));
    }

    #[test]
    fn test_bare_extension_name_accepted() {
        assert_eq!(UploadFormat::from_file_name(".csv").ok(), Some(UploadFormat::Csv));
        assert_eq!(UploadFormat::from_file_name("uploads/.xlsx").ok(), Some(UploadFormat::Xlsx));
        assert!(UploadFormat::from_file_name("csv").is_err());
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        for name in ["report.txt", "report", "report.csv.bak", "archive.zip"] {
            match load_uploaded(b"Recipient\na@x.com\n", name) {
                Err(AppError::UnsupportedFormat { file_name }) => assert_eq!(file_name, name),
                other => panic!("Expected UnsupportedFormat for {}, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_load_csv() {
        let csv = b"Recipient,Status,Reason\na@x.com,bounced,\"Mailbox full, try later\"\nb@x.com,blocked\n";

        let table = load_uploaded(csv, "bounces.csv").expect("load failed");

        assert_eq!(table.columns(), &["Recipient", "Status", "Reason"]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get(0, "Reason"),
            Some(&Cell::Text("Mailbox full, try later".into()))
        );
        assert_eq!(table.get(1, "Reason"), Some(&Cell::Empty));
    }

    #[test]
    fn test_load_csv_keeps_values_as_text() {
        let table = load_uploaded(b"Recipient,Code\na@x.com,00550\n", "x.csv").expect("load failed");
        assert_eq!(table.get(0, "Code"), Some(&Cell::Text("00550".into())));
    }

    #[test]
    fn test_load_csv_with_bom() {
        let table = load_uploaded(b"\xEF\xBB\xBFRecipient\na@x.com\n", "x.csv").expect("load failed");
        assert_eq!(table.columns(), &["Recipient"]);
    }

    #[test]
    fn test_load_csv_wide_row_rejected() {
        let result = load_uploaded(b"Recipient\na@x.com,extra\n", "x.csv");
        assert!(matches!(result, Err(AppError::CsvInvalid(_))));
    }

    #[test]
    fn test_load_csv_non_utf8_rejected() {
        let result = load_uploaded(b"Recipient\n\xff\xfe\n", "x.csv");
        assert!(matches!(result, Err(AppError::NotUtf8)));
    }

    #[test]
    fn test_load_xlsx() {
        let bytes = xlsx_bytes(&[vec!["Recipient", "Status"], vec!["a@x.com", "bounced"]]);

        let table = load_uploaded(&bytes, "bounces.xlsx").expect("load failed");

        assert_eq!(table.columns(), &["Recipient", "Status"]);
        assert_eq!(table.get(0, "Status"), Some(&Cell::Text("bounced".into())));
    }

    #[test]
    fn test_csv_bytes_named_xlsx_fail_to_parse() {
        let result = load_uploaded(b"Recipient\na@x.com\n", "bounces.xlsx");
        assert!(matches!(result, Err(AppError::Parse(_))));
    }
}
