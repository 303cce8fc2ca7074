//! Decoding of the stored contacts spreadsheet.
//!
//! The reference data arrives as base64 text (often line-wrapped by the
//! secrets store). It is decoded with the standard alphabet and read as a
//! workbook whose container type is sniffed from its content.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::contacts::source::ContactsSource;
use crate::error::AppError;
use crate::ingest::spreadsheet::{parse_spreadsheet, SpreadsheetKind};
use crate::table::Table;

/// Label used in errors about the reference table.
pub const CONTACTS_TABLE_LABEL: &str = "contacts list";

/// Decodes a base64 spreadsheet blob into the contacts table.
///
/// # Arguments
///
/// * `blob` - Base64 text; ASCII whitespace is ignored
/// * `email_column` - Column that must be present (the join key)
///
/// # Errors
///
/// - `AppError::Decode` if the blob is not valid base64
/// - `AppError::Parse` if the decoded bytes are not a spreadsheet
/// - `AppError::MissingColumn` if `email_column` is absent
pub fn decode_contacts(blob: &SecretString, email_column: &str) -> Result<Table, AppError> {
    let compact: Vec<u8> = blob
        .expose_secret()
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    let bytes = STANDARD
        .decode(&compact)
        .map_err(|e| AppError::Decode(e.to_string()))?;

    debug!("[CONTACTS] Decoded {} bytes of reference data", bytes.len());

    let table = parse_spreadsheet(&bytes, SpreadsheetKind::Auto)?;
    table.require_column(email_column, CONTACTS_TABLE_LABEL)?;

    info!(
        "[CONTACTS] Loaded {} contacts ({} columns)",
        table.len(),
        table.columns().len()
    );

    Ok(table)
}

/// Fetches the blob from `source` and decodes it.
///
/// # Errors
///
/// Propagates errors from `ContactsSource::fetch` and `decode_contacts`.
pub fn load_contacts(source: &ContactsSource, email_column: &str) -> Result<Table, AppError> {
    let blob = source.fetch()?;
    decode_contacts(&blob, email_column)
}
