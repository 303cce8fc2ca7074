//! Options controlling the join and the rendered reports.

/// Column the uploaded list is keyed by.
pub const DEFAULT_RECIPIENT_COLUMN: &str = "Recipient";

/// Column the contacts list is keyed by. Dropped from the joined output.
pub const DEFAULT_EMAIL_COLUMN: &str = "Email";

/// Column used for sorting and row coloring.
pub const DEFAULT_OWNER_COLUMN: &str = "CS Owner";

/// Number of joined rows included in previews.
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

/// Light fills assigned to owners in order of first appearance (RGB).
pub const DEFAULT_PALETTE: &[u32] = &[
    0xFFF2CC, // pale yellow
    0xDDEBF7, // pale blue
    0xE2EFDA, // pale green
    0xFCE4D6, // pale orange
    0xEDE1F5, // lavender
    0xD9F2F2, // pale teal
    0xF8D7DA, // pale rose
    0xEDEDED, // light grey
];

/// How recipient and email keys are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMatching {
    /// Byte-for-byte equality.
    #[default]
    Exact,
    /// Surrounding whitespace ignored, ASCII case folded.
    CaseInsensitive,
}

impl KeyMatching {
    /// Normalizes a key according to the matching mode.
    pub fn normalize(self, key: &str) -> String {
        match self {
            KeyMatching::Exact => key.to_string(),
            KeyMatching::CaseInsensitive => key.trim().to_ascii_lowercase(),
        }
    }
}

/// Configuration for a join run.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Join key column in the uploaded list.
    pub recipient_column: String,
    /// Join key column in the contacts list.
    pub email_column: String,
    /// Column to sort by, if present in the joined table.
    pub sort_by: Option<String>,
    /// Column whose values select row fills in the spreadsheet.
    pub color_by: Option<String>,
    /// Key comparison mode.
    pub key_matching: KeyMatching,
    /// Fill colors (RGB) cycled across distinct `color_by` values.
    pub palette: Vec<u32>,
    /// Rows returned in previews.
    pub preview_rows: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            recipient_column: DEFAULT_RECIPIENT_COLUMN.to_string(),
            email_column: DEFAULT_EMAIL_COLUMN.to_string(),
            sort_by: Some(DEFAULT_OWNER_COLUMN.to_string()),
            color_by: Some(DEFAULT_OWNER_COLUMN.to_string()),
            key_matching: KeyMatching::Exact,
            palette: DEFAULT_PALETTE.to_vec(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl ReportOptions {
    /// Sets the sort column (`None` keeps upload order).
    pub fn sort_by(mut self, column: Option<&str>) -> Self {
        self.sort_by = column.map(String::from);
        self
    }

    /// Sets the row-coloring column (`None` disables coloring).
    pub fn color_by(mut self, column: Option<&str>) -> Self {
        self.color_by = column.map(String::from);
        self
    }

    /// Sets the key comparison mode.
    pub fn key_matching(mut self, mode: KeyMatching) -> Self {
        self.key_matching = mode;
        self
    }

    /// Replaces the fill palette. An empty palette disables coloring.
    pub fn palette(mut self, colors: Vec<u32>) -> Self {
        self.palette = colors;
        self
    }

    /// Sets the preview row count.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReportOptions::default();
        assert_eq!(options.recipient_column, "Recipient");
        assert_eq!(options.email_column, "Email");
        assert_eq!(options.sort_by.as_deref(), Some("CS Owner"));
        assert_eq!(options.color_by.as_deref(), Some("CS Owner"));
        assert_eq!(options.key_matching, KeyMatching::Exact);
        assert_eq!(options.preview_rows, 10);
        assert!(!options.palette.is_empty());
    }

    #[test]
    fn test_builder() {
        let options = ReportOptions::default()
            .sort_by(None)
            .color_by(Some("Account"))
            .key_matching(KeyMatching::CaseInsensitive)
            .preview_rows(5);

        assert_eq!(options.sort_by, None);
        assert_eq!(options.color_by.as_deref(), Some("Account"));
        assert_eq!(options.key_matching, KeyMatching::CaseInsensitive);
        assert_eq!(options.preview_rows, 5);
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(KeyMatching::Exact.normalize(" A@X.com "), " A@X.com ");
        assert_eq!(KeyMatching::CaseInsensitive.normalize(" A@X.com "), "a@x.com");
    }
}
