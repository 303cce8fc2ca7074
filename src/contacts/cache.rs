//! Populate-once cache for the contacts table.
//!
//! The first caller decodes the reference blob; every later caller shares the
//! same `Arc<Table>`. A failed load leaves the cache empty so the next call
//! tries again with nothing half-initialized.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::contacts::loader::load_contacts;
use crate::contacts::source::ContactsSource;
use crate::error::AppError;
use crate::table::Table;

/// Shared, read-only-once-populated contacts table.
#[derive(Debug)]
pub struct ContactsCache {
    source: Option<ContactsSource>,
    email_column: String,
    table: OnceCell<Arc<Table>>,
}

impl ContactsCache {
    /// Creates an empty cache that loads from `source` on first use.
    pub fn new(source: ContactsSource, email_column: impl Into<String>) -> Self {
        Self {
            source: Some(source),
            email_column: email_column.into(),
            table: OnceCell::new(),
        }
    }

    /// Creates a cache that is already populated with `table`.
    pub fn preloaded(table: Table, email_column: impl Into<String>) -> Self {
        Self {
            source: None,
            email_column: email_column.into(),
            table: OnceCell::with_value(Arc::new(table)),
        }
    }

    /// Returns the contacts table, loading it on first call.
    ///
    /// Concurrent first callers block until one of them has finished loading.
    ///
    /// # Errors
    ///
    /// Propagates load errors; the cache stays empty in that case.
    pub fn get(&self) -> Result<Arc<Table>, AppError> {
        self.table
            .get_or_try_init(|| {
                let source = self.source.as_ref().ok_or_else(|| {
                    AppError::Config("no contacts source configured".into())
                })?;
                debug!("[CONTACTS] Cache miss, loading from {:?}", source);
                load_contacts(source, &self.email_column).map(Arc::new)
            })
            .cloned()
    }

    /// Returns true once the table has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    /// The join-key column the cached table is guaranteed to contain.
    pub fn email_column(&self) -> &str {
        &self.email_column
    }
}
