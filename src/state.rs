//! Application state shared by the command handlers.
//!
//! Holds the populate-once contacts cache and the report options. Both are
//! safe to share across concurrent requests.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::contacts::{ContactsCache, ContactsSource};
use crate::report::ReportOptions;

// ─────────────────────────────────────────────────────────────────────────────
// Application State
// ─────────────────────────────────────────────────────────────────────────────

/// Global application state shared across all commands.
pub struct AppState {
    /// Contacts reference table, loaded on first use.
    pub contacts: Arc<ContactsCache>,
    /// Options applied to every join run.
    /// Protected by RwLock for thread-safe read/write access.
    pub options: RwLock<ReportOptions>,
}

impl AppState {
    /// Creates a new AppState around an injected contacts cache.
    pub fn new(contacts: ContactsCache, options: ReportOptions) -> Self {
        Self {
            contacts: Arc::new(contacts),
            options: RwLock::new(options),
        }
    }

    /// Creates state that loads contacts from `source` with default options.
    pub fn from_source(source: ContactsSource) -> Self {
        let options = ReportOptions::default();
        let cache = ContactsCache::new(source, options.email_column.clone());
        Self::new(cache, options)
    }

    /// Returns a snapshot of the current report options.
    pub async fn get_options(&self) -> ReportOptions {
        self.options.read().await.clone()
    }

    /// Replaces the report options.
    pub async fn set_options(&self, options: ReportOptions) {
        *self.options.write().await = options;
    }
}
