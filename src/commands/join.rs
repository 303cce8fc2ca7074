//! Join command handlers.
//!
//! These commands handle:
//! - Joining an uploaded non-delivery list against the contacts table
//! - Writing the CSV/XLSX exports to a directory
//! - Reading and updating the report options

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::export::write_artifacts;
use crate::report::{transform_with_cache, ExportArtifact, JoinResult, JoinStats, KeyMatching};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response Types
// ─────────────────────────────────────────────────────────────────────────────

/// An uploaded file to enrich.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinUploadRequest {
    /// Name of the uploaded file; the extension selects the parser.
    pub file_name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// Result of a join, ready for display and download.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinUploadResponse {
    /// Joined column names.
    pub columns: Vec<String>,
    /// First rows of the joined table, as strings.
    pub preview: Vec<Vec<String>>,
    /// Match counts.
    pub stats: JoinStats,
    /// Whether rows were grouped by the sort column.
    pub sorted: bool,
    /// `joined_file.csv`.
    pub csv: ExportArtifact,
    /// `joined_file.xlsx`.
    pub xlsx: ExportArtifact,
    /// Wall-clock time of the join in milliseconds.
    pub duration_ms: u64,
}

/// Editable subset of the report options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSettings {
    /// Column to sort by, or `None` to keep upload order.
    pub sort_by: Option<String>,
    /// Column whose values select row fills, or `None` for no coloring.
    pub color_by: Option<String>,
    /// Compare emails ignoring case and surrounding whitespace.
    pub case_insensitive_keys: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Joins the upload against the contacts table and returns both exports.
///
/// # Errors
///
/// Any `AppError` raised by parsing, contacts loading, joining or rendering.
pub async fn join_upload(
    state: &AppState,
    request: JoinUploadRequest,
) -> Result<JoinUploadResponse, AppError> {
    let started = Instant::now();
    let preview_rows = state.get_options().await.preview_rows;

    let result = run_join(state, request).await?;

    let duration_ms = started.elapsed().as_millis() as u64;
    info!(
        "[COMMAND] join_upload finished in {} ms ({} rows)",
        duration_ms, result.stats.total_rows
    );

    Ok(JoinUploadResponse {
        columns: result.table.columns().to_vec(),
        preview: result.preview(preview_rows),
        stats: result.stats,
        sorted: result.sorted,
        csv: result.csv,
        xlsx: result.xlsx,
        duration_ms,
    })
}

/// Joins the upload and writes `joined_file.csv` and `joined_file.xlsx` into `output_dir`.
///
/// # Returns
///
/// Paths of the written files (CSV first).
///
/// # Errors
///
/// Any `AppError` from the join, or `AppError::Io` if writing fails.
pub async fn export_artifacts(
    state: &AppState,
    request: JoinUploadRequest,
    output_dir: PathBuf,
) -> Result<Vec<PathBuf>, AppError> {
    let result = run_join(state, request).await?;

    tokio::task::spawn_blocking(move || write_artifacts(&output_dir, &[&result.csv, &result.xlsx]))
        .await
        .map_err(|e| AppError::Internal(format!("Export task panicked: {}", e)))?
}

/// Returns the current report settings.
pub async fn get_report_settings(state: &AppState) -> ReportSettings {
    let options = state.get_options().await;
    ReportSettings {
        sort_by: options.sort_by,
        color_by: options.color_by,
        case_insensitive_keys: options.key_matching == KeyMatching::CaseInsensitive,
    }
}

/// Updates the report settings used by later joins.
pub async fn update_report_settings(state: &AppState, settings: ReportSettings) {
    let key_matching = if settings.case_insensitive_keys {
        KeyMatching::CaseInsensitive
    } else {
        KeyMatching::Exact
    };
    let options = state
        .get_options()
        .await
        .sort_by(settings.sort_by.as_deref())
        .color_by(settings.color_by.as_deref())
        .key_matching(key_matching);
    state.set_options(options).await;
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Runs the CPU-bound transform on the blocking pool.
async fn run_join(state: &AppState, request: JoinUploadRequest) -> Result<JoinResult, AppError> {
    let options = state.get_options().await;
    let cache = Arc::clone(&state.contacts);

    tokio::task::spawn_blocking(move || {
        transform_with_cache(&request.bytes, &request.file_name, &cache, &options)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Join task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::{ContactsCache, ContactsSource};
    use crate::ingest::spreadsheet::tests::xlsx_bytes;
    use crate::report::ReportOptions;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use tempfile::TempDir;

    fn state() -> AppState {
        let bytes = xlsx_bytes(&[
            vec!["Email", "Account", "CS Owner"],
            vec!["a@x.com", "Acme", "Jo"],
            vec!["c@x.com", "Initech", "Al"],
        ]);
        AppState::from_source(ContactsSource::inline(STANDARD.encode(bytes)))
    }

    fn upload(file_name: &str, body: &str) -> JoinUploadRequest {
        JoinUploadRequest {
            file_name: file_name.to_string(),
            bytes: body.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn test_join_upload_returns_preview_and_artifacts() {
        let state = state();
        let body = "Recipient,Status\na@x.com,bounced\nb@x.com,bounced\n";

        let response = join_upload(&state, upload("bounces.csv", body))
            .await
            .expect("join_upload failed");

        assert_eq!(response.columns, vec!["Recipient", "Status", "Account", "CS Owner"]);
        assert_eq!(response.stats.total_rows, 2);
        assert_eq!(response.stats.matched_rows, 1);
        assert_eq!(response.preview[0], vec!["a@x.com", "bounced", "Acme", "Jo"]);
        assert_eq!(response.preview[1], vec!["b@x.com", "bounced", "", ""]);
        assert_eq!(response.csv.file_name, "joined_file.csv");
        assert_eq!(response.xlsx.file_name, "joined_file.xlsx");
        assert!(state.contacts.is_loaded());
    }

    #[tokio::test]
    async fn test_preview_is_capped() {
        let state = state();
        let mut body = String::from("Recipient\n");
        for i in 0..25 {
            body.push_str(&format!("user{}@x.com\n", i));
        }

        let response = join_upload(&state, upload("bounces.csv", &body))
            .await
            .expect("join_upload failed");

        assert_eq!(response.stats.total_rows, 25);
        assert_eq!(response.preview.len(), 10);
    }

    #[tokio::test]
    async fn test_unsupported_upload_is_reported() {
        let state = state();

        let err = join_upload(&state, upload("report.txt", "Recipient\na@x.com\n"))
            .await
            .expect_err("should fail");

        assert!(matches!(err, AppError::UnsupportedFormat { .. }));
        assert!(!state.contacts.is_loaded());

        let json = serde_json::to_value(&err).expect("serialize");
        assert_eq!(json["title"], "Unsupported File Format");
    }

    #[tokio::test]
    async fn test_export_artifacts_writes_files() {
        let state = state();
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let paths = export_artifacts(
            &state,
            upload("bounces.csv", "Recipient\nc@x.com\n"),
            temp_dir.path().to_path_buf(),
        )
        .await
        .expect("export failed");

        assert_eq!(paths.len(), 2);
        let csv = std::fs::read_to_string(&paths[0]).expect("read csv");
        assert_eq!(csv, "Recipient,Account,CS Owner\nc@x.com,Initech,Al\n");
        assert!(paths[1].ends_with("joined_file.xlsx"));
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let state = AppState::new(
            ContactsCache::preloaded(Default::default(), "Email"),
            ReportOptions::default(),
        );

        let settings = ReportSettings {
            sort_by: None,
            color_by: Some("Account".into()),
            case_insensitive_keys: true,
        };
        update_report_settings(&state, settings.clone()).await;

        assert_eq!(get_report_settings(&state).await, settings);
        assert_eq!(state.get_options().await.preview_rows, 10);
    }

    #[tokio::test]
    async fn test_case_insensitive_setting_applies_to_join() {
        let state = state();
        update_report_settings(
            &state,
            ReportSettings {
                sort_by: Some("CS Owner".into()),
                color_by: Some("CS Owner".into()),
                case_insensitive_keys: true,
            },
        )
        .await;

        let response = join_upload(&state, upload("b.csv", "Recipient\nA@X.COM\n"))
            .await
            .expect("join_upload failed");

        assert_eq!(response.stats.matched_rows, 1);
    }
}
