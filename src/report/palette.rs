//! Deterministic fill assignment for row coloring.
//!
//! Distinct values get palette entries in order of first appearance, cycling
//! when there are more values than colors. Identical input always produces
//! identical colors.

use std::collections::HashMap;

use crate::table::Table;

/// Per-row fill colors for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowColors {
    /// Fill for each row, `None` when the grouping value is empty.
    pub rows: Vec<Option<u32>>,
    /// Distinct grouping values with their assigned fill, in first-appearance order.
    pub legend: Vec<(String, u32)>,
}

/// Assigns fills to rows by the value of `column`.
///
/// Returns `None` if the column is absent or the palette is empty.
pub fn assign_row_colors(table: &Table, column: &str, palette: &[u32]) -> Option<RowColors> {
    let idx = table.column_index(column)?;
    if palette.is_empty() {
        return None;
    }

    let mut assigned: HashMap<String, u32> = HashMap::new();
    let mut colors = RowColors::default();

    for row in table.rows() {
        let fill = row[idx].as_key().map(|value| {
            let next = palette[assigned.len() % palette.len()];
            *assigned.entry(value.clone()).or_insert_with(|| {
                colors.legend.push((value, next));
                next
            })
        });
        colors.rows.push(fill);
    }

    Some(colors)
}
