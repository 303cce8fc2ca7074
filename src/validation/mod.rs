//! Upload validation.
//!
//! Checks uploaded CSV bytes for encoding, header and shape problems before
//! they are parsed, so the operator gets a precise message.

pub mod csv_validator;

pub use csv_validator::{
    validate, CsvValidationError, CsvValidationResult, CsvValidationStats, CsvValidationWarning,
    LineEndings,
};
