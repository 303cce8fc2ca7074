//! Left join of the uploaded list against the contacts table.
//!
//! Every uploaded row yields exactly one joined row. The contacts-side key
//! column never reaches the output; other column names present on both
//! sides get `_x` (upload) and `_y` (contacts) suffixes.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::contacts::CONTACTS_TABLE_LABEL;
use crate::error::AppError;
use crate::ingest::UPLOAD_TABLE_LABEL;
use crate::report::options::ReportOptions;
use crate::table::{Cell, Table};

/// Suffix for overlapping upload-side column names.
const LEFT_SUFFIX: &str = "_x";

/// Suffix for overlapping contacts-side column names.
const RIGHT_SUFFIX: &str = "_y";

/// Match counts for one join run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinStats {
    /// Rows in the upload (and in the output).
    pub total_rows: usize,
    /// Rows whose recipient was found in the contacts list.
    pub matched_rows: usize,
    /// Rows left with empty contact columns.
    pub unmatched_rows: usize,
    /// Contacts rows ignored because an earlier row had the same email.
    pub duplicate_contact_emails: usize,
}

/// Joins `uploaded` to `contacts` on the configured key columns.
///
/// # Errors
///
/// Returns `AppError::MissingColumn` if either key column is absent.
pub fn join(
    uploaded: &Table,
    contacts: &Table,
    options: &ReportOptions,
) -> Result<(Table, JoinStats), AppError> {
    let recipient_idx = uploaded.require_column(&options.recipient_column, UPLOAD_TABLE_LABEL)?;
    let email_idx = contacts.require_column(&options.email_column, CONTACTS_TABLE_LABEL)?;

    // 1) Index contacts by key; first occurrence wins
    let mut index: HashMap<String, usize> = HashMap::with_capacity(contacts.len());
    let mut duplicates = 0usize;
    for (row_idx, row) in contacts.rows().iter().enumerate() {
        let Some(key) = row[email_idx].as_key() else {
            continue;
        };
        let key = options.key_matching.normalize(&key);
        if index.contains_key(&key) {
            duplicates += 1;
        } else {
            index.insert(key, row_idx);
        }
    }
    if duplicates > 0 {
        warn!(
            "[JOIN] Contacts list has {} duplicate email rows; first occurrence used",
            duplicates
        );
    }

    // 2) Output columns: upload columns then contact columns, without the email key
    let left_cols: Vec<usize> = (0..uploaded.columns().len())
        .filter(|&i| {
            i == recipient_idx || uploaded.columns()[i] != options.email_column
        })
        .collect();
    let right_cols: Vec<usize> = (0..contacts.columns().len())
        .filter(|&i| i != email_idx && contacts.columns()[i] != options.email_column)
        .collect();

    let left_names: HashSet<&str> = left_cols
        .iter()
        .map(|&i| uploaded.columns()[i].as_str())
        .collect();
    let right_names: HashSet<&str> = right_cols
        .iter()
        .map(|&i| contacts.columns()[i].as_str())
        .collect();

    let mut columns = Vec::with_capacity(left_cols.len() + right_cols.len());
    for &i in &left_cols {
        let name = &uploaded.columns()[i];
        if right_names.contains(name.as_str()) {
            columns.push(format!("{}{}", name, LEFT_SUFFIX));
        } else {
            columns.push(name.clone());
        }
    }
    for &i in &right_cols {
        let name = &contacts.columns()[i];
        if left_names.contains(name.as_str()) {
            columns.push(format!("{}{}", name, RIGHT_SUFFIX));
        } else {
            columns.push(name.clone());
        }
    }

    // 3) Rows
    let mut joined = Table::new(columns);
    let mut matched = 0usize;
    for row in uploaded.rows() {
        let contact = row[recipient_idx]
            .as_key()
            .map(|key| options.key_matching.normalize(&key))
            .and_then(|key| index.get(&key))
            .map(|&idx| &contacts.rows()[idx]);

        let mut out: Vec<Cell> = left_cols.iter().map(|&i| row[i].clone()).collect();
        match contact {
            Some(contact_row) => {
                matched += 1;
                out.extend(right_cols.iter().map(|&i| contact_row[i].clone()));
            }
            None => out.extend(right_cols.iter().map(|_| Cell::Empty)),
        }
        joined.push_row(out)?;
    }

    let stats = JoinStats {
        total_rows: uploaded.len(),
        matched_rows: matched,
        unmatched_rows: uploaded.len() - matched,
        duplicate_contact_emails: duplicates,
    };

    info!(
        "[JOIN] Joined {} rows: {} matched, {} unmatched",
        stats.total_rows, stats.matched_rows, stats.unmatched_rows
    );

    Ok((joined, stats))
}
