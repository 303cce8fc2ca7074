//! Validation of uploaded CSV bytes before they are parsed into a table.
//!
//! Catches the problems operators hit most often when exporting bounce
//! reports from mail tools:
//! - UTF-8 encoding errors
//! - Missing headers
//! - Inconsistent column counts
//! - Line ending detection

use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Maximum number of column-count errors collected before validation stops.
const MAX_ERRORS_REPORTED: usize = 20;

/// Row count above which a large upload warning is raised.
const LARGE_UPLOAD_ROWS: u64 = 50_000;

/// UTF-8 BOM bytes.
pub(crate) const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

// ─────────────────────────────────────────────────────────────────────────────
// Public Types
// ─────────────────────────────────────────────────────────────────────────────

/// Result of CSV validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvValidationResult {
    /// Whether the upload passed validation (no errors).
    pub ok: bool,
    /// List of validation errors found.
    pub errors: Vec<CsvValidationError>,
    /// List of validation warnings found.
    pub warnings: Vec<CsvValidationWarning>,
    /// Statistics about the upload.
    pub stats: CsvValidationStats,
}

/// Statistics collected during validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsvValidationStats {
    /// Upload size in bytes.
    pub size_bytes: u64,
    /// Headers found in the CSV.
    pub headers: Vec<String>,
    /// Number of data rows (excluding the header).
    pub row_count: u64,
    /// Detected line ending style.
    pub line_endings: LineEndings,
}

/// Detected line ending style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineEndings {
    /// Unix-style line endings (\n).
    LF,
    /// Windows-style line endings (\r\n).
    CRLF,
    /// Mixed line endings (both \n and \r\n found).
    Mixed,
    /// No line endings detected (single line or empty).
    #[default]
    Unknown,
}

/// Validation errors that prevent successful processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CsvValidationError {
    /// Upload is not valid UTF-8.
    NotUtf8,
    /// Upload is empty (0 bytes).
    EmptyFile,
    /// No headers found in the CSV.
    NoHeaders,
    /// Row has more columns than the header.
    InconsistentColumns {
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns found.
        found: usize,
        /// 1-based row number where the error occurred.
        row: u64,
    },
    /// CSV parsing error.
    CsvParseError {
        /// Error message.
        message: String,
    },
}

/// Validation warnings that don't prevent processing but may indicate issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CsvValidationWarning {
    /// Upload starts with UTF-8 BOM.
    HasBom,
    /// Upload contains mixed line endings.
    MixedLineEndings,
    /// Some rows have fewer columns than the header; they are padded.
    ShortRows {
        /// Number of short rows.
        count: u64,
    },
    /// Upload has more rows than usually seen in a bounce report.
    LargeUpload {
        /// Number of data rows.
        rows: u64,
    },
}

impl CsvValidationResult {
    /// Turns a failed validation into the error reported to the operator.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotUtf8` or `AppError::CsvInvalid` for the first error found.
    pub fn into_result(self) -> Result<Self, AppError> {
        match self.errors.first() {
            None => Ok(self),
            Some(CsvValidationError::NotUtf8) => Err(AppError::NotUtf8),
            Some(CsvValidationError::EmptyFile) => {
                Err(AppError::CsvInvalid("the file is empty".into()))
            }
            Some(CsvValidationError::NoHeaders) => {
                Err(AppError::CsvInvalid("no header row found".into()))
            }
            Some(CsvValidationError::InconsistentColumns {
                expected,
                found,
                row,
            }) => Err(AppError::CsvInvalid(format!(
                "row {} has {} fields, expected {}",
                row, found, expected
            ))),
            Some(CsvValidationError::CsvParseError { message }) => {
                Err(AppError::CsvInvalid(message.clone()))
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Validates uploaded CSV bytes.
///
/// Short rows are only a warning (they are padded with empty cells when
/// parsed); rows wider than the header are errors.
pub fn validate(bytes: &[u8]) -> CsvValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut stats = CsvValidationStats {
        size_bytes: bytes.len() as u64,
        ..Default::default()
    };

    // Step 1: Empty upload
    if bytes.is_empty() {
        return CsvValidationResult {
            ok: false,
            errors: vec![CsvValidationError::EmptyFile],
            warnings,
            stats,
        };
    }

    // Step 2: BOM
    let has_bom = bytes.starts_with(UTF8_BOM);
    if has_bom {
        warnings.push(CsvValidationWarning::HasBom);
    }
    let data = strip_bom(bytes);

    // Step 3: UTF-8
    if std::str::from_utf8(data).is_err() {
        return CsvValidationResult {
            ok: false,
            errors: vec![CsvValidationError::NotUtf8],
            warnings,
            stats,
        };
    }

    // Step 4: Line endings
    stats.line_endings = detect_line_endings(data);
    if stats.line_endings == LineEndings::Mixed {
        warnings.push(CsvValidationWarning::MixedLineEndings);
    }

    // Step 5: Headers
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(String::from).collect(),
        Err(e) => {
            errors.push(CsvValidationError::CsvParseError {
                message: e.to_string(),
            });
            return CsvValidationResult {
                ok: false,
                errors,
                warnings,
                stats,
            };
        }
    };

    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        errors.push(CsvValidationError::NoHeaders);
        return CsvValidationResult {
            ok: false,
            errors,
            warnings,
            stats,
        };
    }

    let expected = headers.len();
    stats.headers = headers;

    // Step 6: Records
    let mut short_rows: u64 = 0;
    for result in reader.records() {
        match result {
            Ok(record) => {
                stats.row_count += 1;
                if record.len() > expected {
                    errors.push(CsvValidationError::InconsistentColumns {
                        expected,
                        found: record.len(),
                        row: stats.row_count + 1, // +1 for header, making it 1-based
                    });
                    if errors.len() >= MAX_ERRORS_REPORTED {
                        break;
                    }
                } else if record.len() < expected {
                    short_rows += 1;
                }
            }
            Err(e) => {
                errors.push(CsvValidationError::CsvParseError {
                    message: e.to_string(),
                });
                break;
            }
        }
    }

    if short_rows > 0 {
        warnings.push(CsvValidationWarning::ShortRows { count: short_rows });
    }
    if stats.row_count > LARGE_UPLOAD_ROWS {
        warnings.push(CsvValidationWarning::LargeUpload {
            rows: stats.row_count,
        });
    }

    CsvValidationResult {
        ok: errors.is_empty(),
        errors,
        warnings,
        stats,
    }
}

/// Returns the bytes with a leading UTF-8 BOM removed.
pub(crate) fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Detects line ending style in the given bytes.
fn detect_line_endings(data: &[u8]) -> LineEndings {
    let mut has_lf = false;
    let mut has_crlf = false;

    let mut i = 0;
    while i < data.len() {
        if data[i] == b'\r' && i + 1 < data.len() && data[i + 1] == b'\n' {
            has_crlf = true;
            i += 2;
        } else if data[i] == b'\n' {
            has_lf = true;
            i += 1;
        } else {
            i += 1;
        }
    }

    match (has_lf, has_crlf) {
        (true, true) => LineEndings::Mixed,
        (true, false) => LineEndings::LF,
        (false, true) => LineEndings::CRLF,
        (false, false) => LineEndings::Unknown,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
