//! Join & report engine.
//!
//! Takes the uploaded non-delivery list and the contacts table, joins them on
//! email address, groups rows by owner, and renders the CSV and XLSX exports.
//!
//! Key features:
//! - Left join that preserves every uploaded row
//! - Optional stable sort by owner
//! - Deterministic per-owner row fills in the spreadsheet
//! - All-or-nothing: any failure aborts the run without partial output

mod artifact;
mod join;
mod options;
mod palette;
mod render_csv;
mod render_xlsx;
mod sort;

use tracing::info;

pub use artifact::{
    ExportArtifact, CSV_FILE_NAME, CSV_MIME_TYPE, XLSX_FILE_NAME, XLSX_MIME_TYPE,
};
pub use join::{join, JoinStats};
pub use options::{
    KeyMatching, ReportOptions, DEFAULT_EMAIL_COLUMN, DEFAULT_OWNER_COLUMN, DEFAULT_PALETTE,
    DEFAULT_PREVIEW_ROWS, DEFAULT_RECIPIENT_COLUMN,
};
pub use palette::{assign_row_colors, RowColors};
pub use render_csv::render_csv;
pub use render_xlsx::{render_spreadsheet, SHEET_NAME};
pub use sort::sort_by_column;

use crate::contacts::ContactsCache;
use crate::error::AppError;
use crate::ingest::load_uploaded;
use crate::table::Table;

/// Everything produced by one join run.
#[derive(Debug, Clone)]
pub struct JoinResult {
    /// Joined (and possibly sorted) rows.
    pub table: Table,
    /// Match counts.
    pub stats: JoinStats,
    /// Whether the rows were reordered by the sort column.
    pub sorted: bool,
    /// `joined_file.csv`.
    pub csv: ExportArtifact,
    /// `joined_file.xlsx`.
    pub xlsx: ExportArtifact,
}

impl JoinResult {
    /// First `rows` rows of the joined table as strings.
    pub fn preview(&self, rows: usize) -> Vec<Vec<String>> {
        self.table.preview(rows)
    }
}

/// Joins an upload against an already-loaded contacts table.
///
/// # Arguments
///
/// * `upload` - Raw bytes of the uploaded file
/// * `file_name` - Upload name; the extension selects the parser
/// * `contacts` - Reference table keyed by `options.email_column`
/// * `options` - Join keys, sort/color columns, palette
///
/// # Errors
///
/// - `AppError::UnsupportedFormat` before any parsing if the extension is unknown
/// - `AppError::NotUtf8`, `AppError::CsvInvalid`, `AppError::Parse` for bad uploads
/// - `AppError::MissingColumn` if a join key column is absent
/// - `AppError::Render` if an export cannot be produced
pub fn transform(
    upload: &[u8],
    file_name: &str,
    contacts: &Table,
    options: &ReportOptions,
) -> Result<JoinResult, AppError> {
    let uploaded = load_uploaded(upload, file_name)?;
    build_result(&uploaded, contacts, options)
}

/// Joins an upload against the cached contacts table, loading it on first use.
///
/// The upload is parsed before the cache is touched, so an unsupported or
/// malformed upload never triggers a contacts load.
///
/// # Errors
///
/// Same as `transform`, plus contacts load errors (`Decode`, `Parse`, `Config`).
pub fn transform_with_cache(
    upload: &[u8],
    file_name: &str,
    cache: &ContactsCache,
    options: &ReportOptions,
) -> Result<JoinResult, AppError> {
    let uploaded = load_uploaded(upload, file_name)?;
    let contacts = cache.get()?;
    build_result(&uploaded, &contacts, options)
}

fn build_result(
    uploaded: &Table,
    contacts: &Table,
    options: &ReportOptions,
) -> Result<JoinResult, AppError> {
    let (mut table, stats) = join(uploaded, contacts, options)?;

    let sorted = match options.sort_by.as_deref() {
        Some(column) => sort_by_column(&mut table, column),
        None => false,
    };

    let csv = ExportArtifact::csv(render_csv(&table)?);
    let xlsx = ExportArtifact::xlsx(render_spreadsheet(
        &table,
        options.color_by.as_deref(),
        &options.palette,
    )?);

    info!(
        "[REPORT] Produced {} ({} bytes) and {} ({} bytes)",
        csv.file_name,
        csv.bytes.len(),
        xlsx.file_name,
        xlsx.bytes.len()
    );

    Ok(JoinResult {
        table,
        stats,
        sorted,
        csv,
        xlsx,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::ContactsSource;
    use crate::ingest::spreadsheet::tests::xlsx_bytes;
    use crate::ingest::{parse_spreadsheet, SpreadsheetKind};
    use crate::table::Cell;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use chrono::NaiveDate;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    fn contacts() -> Table {
        Table::from_raw(
            vec!["Email".into(), "Account".into(), "CS Owner".into()],
            vec![
                vec![Cell::from_text("a@x.com"), Cell::from_text("Acme"), Cell::from_text("Jo")],
                vec![Cell::from_text("c@x.com"), Cell::from_text("Initech"), Cell::from_text("Al")],
            ],
        )
        .expect("table build failed")
    }

    #[test]
    fn test_matched_scenario() {
        let result = transform(
            b"Recipient,Status\na@x.com,bounced\n",
            "bounces.csv",
            &contacts(),
            &ReportOptions::default(),
        )
        .expect("transform failed");

        assert_eq!(
            result.table.columns(),
            &["Recipient", "Status", "Account", "CS Owner"]
        );
        assert_eq!(
            result.table.rows()[0],
            vec![
                Cell::from_text("a@x.com"),
                Cell::from_text("bounced"),
                Cell::from_text("Acme"),
                Cell::from_text("Jo"),
            ]
        );
    }

    #[test]
    fn test_unmatched_scenario() {
        let result = transform(
            b"Recipient,Status\nb@x.com,bounced\n",
            "bounces.csv",
            &contacts(),
            &ReportOptions::default(),
        )
        .expect("transform failed");

        assert_eq!(
            result.table.rows()[0],
            vec![
                Cell::from_text("b@x.com"),
                Cell::from_text("bounced"),
                Cell::Empty,
                Cell::Empty,
            ]
        );
        assert_eq!(result.stats.unmatched_rows, 1);
    }

    #[test]
    fn test_unsupported_format_before_join() {
        // Contacts without an Email column would fail the join; the format error comes first.
        let no_key = Table::new(vec!["Account".into()]);
        let result = transform(
            b"Recipient\na@x.com\n",
            "report.txt",
            &no_key,
            &ReportOptions::default(),
        );
        assert!(matches!(result, Err(AppError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_rows_sorted_by_owner_and_exports_match() {
        let upload = b"Recipient,Status\na@x.com,bounced\nzz@x.com,blocked\nc@x.com,bounced\n";
        let result = transform(upload, "b.csv", &contacts(), &ReportOptions::default())
            .expect("transform failed");

        assert!(result.sorted);
        assert_eq!(result.stats.total_rows, 3);
        let owners: Vec<String> = (0..result.table.len())
            .map(|i| result.table.get(i, "CS Owner").expect("cell").to_string())
            .collect();
        assert_eq!(owners, vec!["Al", "Jo", ""]);

        assert_eq!(result.csv.file_name, "joined_file.csv");
        assert_eq!(result.csv.mime_type, "text/csv");
        assert_eq!(result.xlsx.file_name, "joined_file.xlsx");
        assert_eq!(
            result.xlsx.mime_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );

        let from_csv = load_uploaded(&result.csv.bytes, "joined_file.csv").expect("csv parse");
        let from_xlsx =
            parse_spreadsheet(&result.xlsx.bytes, SpreadsheetKind::Xlsx).expect("xlsx parse");
        assert_eq!(from_csv.preview(10), result.preview(10));
        assert_eq!(from_xlsx.preview(10), result.preview(10));
    }

    #[test]
    fn test_spreadsheet_dates_pass_through_unchanged() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let bounced_at = ExcelDateTime::from_ymd(2024, 3, 15).expect("valid date");
        sheet.write_string(0, 0, "Recipient").expect("write");
        sheet.write_string(0, 1, "Bounced At").expect("write");
        sheet.write_string(1, 0, "a@x.com").expect("write");
        sheet
            .write_datetime_with_format(1, 1, &bounced_at, &date_format)
            .expect("write date");
        let upload = workbook.save_to_buffer().expect("save workbook");

        let result = transform(&upload, "bounces.xlsx", &contacts(), &ReportOptions::default())
            .expect("transform failed");

        let expected = NaiveDate::from_ymd_opt(2024, 3, 15)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date");
        assert_eq!(result.table.get(0, "Bounced At"), Some(&Cell::DateTime(expected)));

        let csv = String::from_utf8(result.csv.bytes.clone()).expect("utf-8 csv");
        assert_eq!(
            csv,
            "Recipient,Bounced At,Account,CS Owner\na@x.com,2024-03-15 00:00:00,Acme,Jo\n"
        );

        let from_xlsx =
            parse_spreadsheet(&result.xlsx.bytes, SpreadsheetKind::Xlsx).expect("xlsx parse");
        assert_eq!(from_xlsx.get(0, "Bounced At"), Some(&Cell::DateTime(expected)));
    }

    #[test]
    fn test_sort_disabled_keeps_upload_order() {
        let upload = b"Recipient\nzz@x.com\na@x.com\nc@x.com\n";
        let options = ReportOptions::default().sort_by(None);
        let result = transform(upload, "b.csv", &contacts(), &options).expect("transform failed");

        assert!(!result.sorted);
        assert_eq!(result.table.get(0, "Recipient"), Some(&Cell::from_text("zz@x.com")));
    }

    #[test]
    fn test_transform_with_cache_loads_contacts_once() {
        let bytes = xlsx_bytes(&[
            vec!["Email", "Account", "CS Owner"],
            vec!["a@x.com", "Acme", "Jo"],
        ]);
        let cache = ContactsCache::new(ContactsSource::inline(STANDARD.encode(bytes)), "Email");

        let upload = b"Recipient,Status\na@x.com,bounced\n";
        let first = transform_with_cache(upload, "b.csv", &cache, &ReportOptions::default())
            .expect("first transform failed");
        let second = transform_with_cache(upload, "b.csv", &cache, &ReportOptions::default())
            .expect("second transform failed");

        assert!(cache.is_loaded());
        assert_eq!(first.table, second.table);
        assert_eq!(first.stats.matched_rows, 1);
    }

    #[test]
    fn test_bad_upload_does_not_load_contacts() {
        let cache = ContactsCache::new(ContactsSource::inline("@@@ not base64"), "Email");

        let result = transform_with_cache(b"x", "report.txt", &cache, &ReportOptions::default());

        assert!(matches!(result, Err(AppError::UnsupportedFormat { .. })));
        assert!(!cache.is_loaded());
    }

    #[test]
    fn test_contacts_failure_is_reported_and_cache_stays_empty() {
        let cache = ContactsCache::new(ContactsSource::inline("@@@ not base64"), "Email");

        let result = transform_with_cache(
            b"Recipient\na@x.com\n",
            "b.csv",
            &cache,
            &ReportOptions::default(),
        );

        assert!(matches!(result, Err(AppError::Decode(_))));
        assert!(!cache.is_loaded());
    }
}
