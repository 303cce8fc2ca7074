//! Enriches lists of non-delivered emails with account and CS owner details.
//!
//! An uploaded bounce list (`.csv`, `.xlsx` or `.xls`) is left-joined on
//! `Recipient` against a contacts spreadsheet keyed by `Email`. The joined
//! rows are grouped by owner and exported as `joined_file.csv` and a styled
//! `joined_file.xlsx`.

pub mod commands;
pub mod contacts;
pub mod error;
pub mod export;
pub mod ingest;
pub mod report;
pub mod state;
pub mod table;
pub mod validation;

pub use contacts::{ContactsCache, ContactsSource};
pub use error::{AppError, ErrorPresentation};
pub use report::{transform, transform_with_cache, JoinResult, ReportOptions};
pub use state::AppState;
pub use table::{Cell, Table};
