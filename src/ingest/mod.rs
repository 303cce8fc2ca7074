//! Parsing of uploaded files and stored spreadsheets into tables.

pub mod spreadsheet;
pub mod upload;

pub use spreadsheet::{parse_spreadsheet, SpreadsheetKind};
pub use upload::{load_uploaded, UploadFormat, UPLOAD_TABLE_LABEL};
