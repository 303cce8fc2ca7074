//! Downloadable outputs of a join run.

use serde::{Deserialize, Serialize};

/// File name of the CSV export.
pub const CSV_FILE_NAME: &str = "joined_file.csv";

/// File name of the XLSX export.
pub const XLSX_FILE_NAME: &str = "joined_file.xlsx";

/// MIME type of the CSV export.
pub const CSV_MIME_TYPE: &str = "text/csv";

/// MIME type of the XLSX export.
pub const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// A rendered file ready to hand to a download mechanism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Wraps CSV bytes with the CSV file name and MIME type.
    pub fn csv(bytes: Vec<u8>) -> Self {
        Self {
            file_name: CSV_FILE_NAME.to_string(),
            mime_type: CSV_MIME_TYPE.to_string(),
            bytes,
        }
    }

    /// Wraps XLSX bytes with the XLSX file name and MIME type.
    pub fn xlsx(bytes: Vec<u8>) -> Self {
        Self {
            file_name: XLSX_FILE_NAME.to_string(),
            mime_type: XLSX_MIME_TYPE.to_string(),
            bytes,
        }
    }
}
