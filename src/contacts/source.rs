//! Where the encoded contacts spreadsheet comes from.
//!
//! The blob is a secret: it is held as a `SecretString` from the moment it
//! is read and never logged. The `Debug` implementation of `ContactsSource`
//! redacts inline values.

use std::fmt;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::AppError;

/// Environment variable consulted by the default source.
pub const CONTACTS_ENV_VAR: &str = "ALL_CONTACTS_CONTENT";

/// Location of the base64-encoded contacts spreadsheet.
pub enum ContactsSource {
    /// The blob itself, already fetched by the caller.
    Inline(SecretString),
    /// An environment variable holding the blob.
    EnvVar(String),
    /// A JSON secrets document shaped `{"all_contacts": {"content": "..."}}`.
    SecretsFile(PathBuf),
}

impl fmt::Debug for ContactsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactsSource::Inline(_) => f.debug_tuple("Inline").field(&"***").finish(),
            ContactsSource::EnvVar(name) => f.debug_tuple("EnvVar").field(name).finish(),
            ContactsSource::SecretsFile(path) => {
                f.debug_tuple("SecretsFile").field(path).finish()
            }
        }
    }
}

impl Default for ContactsSource {
    fn default() -> Self {
        ContactsSource::EnvVar(CONTACTS_ENV_VAR.to_string())
    }
}

/// Internal type for the JSON secrets document.
#[derive(Deserialize)]
struct SecretsDocument {
    all_contacts: Option<ContactsSecret>,
}

#[derive(Deserialize)]
struct ContactsSecret {
    content: String,
}

impl ContactsSource {
    /// Wraps an already-fetched blob.
    pub fn inline(blob: impl Into<String>) -> Self {
        ContactsSource::Inline(SecretString::from(blob.into()))
    }

    /// Fetches the encoded blob.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the variable or secrets entry is missing
    /// or the secrets document is malformed, and `AppError::Io` if the
    /// secrets file cannot be read.
    pub fn fetch(&self) -> Result<SecretString, AppError> {
        match self {
            ContactsSource::Inline(secret) => {
                Ok(SecretString::from(secret.expose_secret().to_string()))
            }
            ContactsSource::EnvVar(name) => std::env::var(name)
                .map(SecretString::from)
                .map_err(|_| AppError::Config(format!("environment variable {} is not set", name))),
            ContactsSource::SecretsFile(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    AppError::Io(format!("Failed to read {}: {}", path.display(), e))
                })?;
                parse_secrets_document(&raw)
            }
        }
    }
}

fn parse_secrets_document(raw: &str) -> Result<SecretString, AppError> {
    let doc: SecretsDocument = serde_json::from_str(raw)
        .map_err(|e| AppError::Config(format!("Malformed secrets document: {}", e)))?;

    doc.all_contacts
        .map(|entry| SecretString::from(entry.content))
        .ok_or_else(|| AppError::Config("secrets document has no contacts entry".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_inline_fetch() {
        let source = ContactsSource::inline("UEsDBA==");
        let blob = source.fetch().expect("fetch failed");
        assert_eq!(blob.expose_secret(), "UEsDBA==");
    }

    #[test]
    fn test_debug_redacts_inline_blob() {
        let source = ContactsSource::inline("UEsDBBQABgAIAAAAIQ");
        let rendered = format!("{:?}", source);
        assert!(!rendered.contains("UEsDBBQ"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_missing_env_var_is_config_error() {
        let source = ContactsSource::EnvVar("NONDELIVERY_JOINER_TEST_UNSET_VAR".into());
        assert!(matches!(source.fetch(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_secrets_file_fetch() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(br#"{"all_contacts": {"content": "QUJD"}, "other": {"x": 1}}"#)
            .expect("Failed to write secrets");
        file.flush().expect("Failed to flush");

        let source = ContactsSource::SecretsFile(file.path().to_path_buf());
        let blob = source.fetch().expect("fetch failed");
        assert_eq!(blob.expose_secret(), "QUJD");
    }

    #[test]
    fn test_secrets_document_without_entry() {
        let result = parse_secrets_document(r#"{"smtp": {"content": "x"}}"#);
        assert!(matches!(result, Err(AppError::Config(_))));

        let result = parse_secrets_document("not json");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_missing_secrets_file_is_io_error() {
        let source = ContactsSource::SecretsFile(PathBuf::from("/nonexistent/secrets.json"));
        assert!(matches!(source.fetch(), Err(AppError::Io(_))));
    }
}
