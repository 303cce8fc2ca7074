//! Grouping of joined rows by a column, usually the CS owner.

use tracing::debug;

use crate::table::Table;

/// Stable ascending sort by `column`. Missing column is a no-op.
///
/// Returns true if the table was sorted.
pub fn sort_by_column(table: &mut Table, column: &str) -> bool {
    let Some(idx) = table.column_index(column) else {
        debug!("[SORT] Column '{}' not present, keeping upload order", column);
        return false;
    };

    table
        .rows_mut()
        .sort_by(|a, b| a[idx].sort_cmp(&b[idx]));
    true
}
