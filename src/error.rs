use serde::Serialize;
use thiserror::Error;

/// Patterns (lowercase) that indicate sensitive data not safe for UI display.
/// Used by `contains_sensitive()` for case-insensitive matching.
pub(crate) const SENSITIVE_PATTERNS: &[&str] = &[
    "all_contacts",
    "secret",
    "bearer ",
    "access_token",
    "authorization:",
];

/// Returns true if the message contains any sensitive pattern (case-insensitive).
fn contains_sensitive(msg: &str) -> bool {
    let lower = msg.to_ascii_lowercase();
    SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Sanitizes a message for UI display.
/// If sensitive content is detected, returns the fallback instead.
fn sanitize_message(msg: &str, fallback: &str) -> String {
    if contains_sensitive(msg) {
        fallback.into()
    } else {
        msg.to_string()
    }
}

/// User-friendly error presentation for the frontend.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPresentation {
    pub title: String,
    pub message: String,
    pub action: Option<String>,
}

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Upload ────────────────────────────────────────────────────────────────
    #[error("Unsupported file format: {file_name}")]
    UnsupportedFormat { file_name: String },

    #[error("File is not valid UTF-8")]
    NotUtf8,

    #[error("Invalid CSV: {0}")]
    CsvInvalid(String),

    #[error("Missing required column '{column}' in {table}")]
    MissingColumn { table: String, column: String },

    // ── Reference data ────────────────────────────────────────────────────────
    #[error("Reference data is not valid base64: {0}")]
    Decode(String),

    #[error("Could not parse spreadsheet: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // ── Export ────────────────────────────────────────────────────────────────
    #[error("Failed to render {format} output: {message}")]
    Render { format: String, message: String },

    #[error("I/O error: {0}")]
    Io(String),

    // ── Generic fallback ──────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Converts the error into a user-friendly presentation suitable for UI display.
    /// Never leaks the reference blob or any other secret material.
    pub fn to_presentation(&self) -> ErrorPresentation {
        match self {
            // ── Upload ────────────────────────────────────────────────────────
            AppError::UnsupportedFormat { file_name } => ErrorPresentation {
                title: "Unsupported File Format".into(),
                message: format!(
                    "'{}' is not supported. Please upload a .csv, .xlsx or .xls file.",
                    file_name
                ),
                action: Some("Upload a .csv, .xlsx or .xls file".into()),
            },

            AppError::NotUtf8 => ErrorPresentation {
                title: "Invalid File Encoding".into(),
                message: "The file must be UTF-8 encoded. Please re-save your file with UTF-8 encoding.".into(),
                action: Some("Convert file to UTF-8".into()),
            },

            AppError::CsvInvalid(msg) => ErrorPresentation {
                title: "Invalid CSV".into(),
                message: format!("The CSV file has a formatting problem: {}", msg),
                action: Some("Fix the CSV file and try again".into()),
            },

            AppError::MissingColumn { table, column } => ErrorPresentation {
                title: "Missing Column".into(),
                message: format!("The {} has no '{}' column.", table, column),
                action: Some(format!("Add a '{}' column and try again", column)),
            },

            // ── Reference data ────────────────────────────────────────────────
            AppError::Decode(_) => ErrorPresentation {
                title: "Contacts Unavailable".into(),
                message: "The stored contacts list could not be decoded.".into(),
                action: Some("Ask an administrator to re-upload the contacts list".into()),
            },

            AppError::Parse(msg) => ErrorPresentation {
                title: "Unreadable Spreadsheet".into(),
                message: sanitize_message(
                    &format!("The spreadsheet could not be read: {}", msg),
                    "The spreadsheet could not be read.",
                ),
                action: Some("Check that the file is a valid spreadsheet".into()),
            },

            AppError::Config(_) => ErrorPresentation {
                title: "Not Configured".into(),
                message: "The contacts list has not been configured for this deployment.".into(),
                action: Some("Ask an administrator to configure the contacts list".into()),
            },

            // ── Export ────────────────────────────────────────────────────────
            AppError::Render { format, .. } => ErrorPresentation {
                title: "Export Failed".into(),
                message: format!("Could not produce the {} download.", format),
                action: Some("Try again".into()),
            },

            AppError::Io(msg) => ErrorPresentation {
                title: "File Error".into(),
                message: sanitize_message(msg, "A file could not be read or written."),
                action: Some("Check the output location and try again".into()),
            },

            // ── Generic ───────────────────────────────────────────────────────
            AppError::Internal(_) => ErrorPresentation {
                title: "Unexpected Error".into(),
                message: "Something went wrong. Please try again.".into(),
                action: Some("Try again".into()),
            },
        }
    }
}

// Allow AppError to be returned straight to a front end
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_presentation().serialize(serializer)
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::CsvInvalid(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}
