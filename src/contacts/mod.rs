//! Contacts reference data: where it comes from, how it is decoded, and the
//! process-wide cache that holds it.

pub mod cache;
pub mod loader;
pub mod source;

pub use cache::ContactsCache;
pub use loader::{decode_contacts, load_contacts, CONTACTS_TABLE_LABEL};
pub use source::{ContactsSource, CONTACTS_ENV_VAR};
