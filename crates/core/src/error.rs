//! Error types for covershift

use thiserror::Error;

use crate::category::TimeSlice;

/// Broad classification of an [`Error`].
///
/// Callers use this to decide how a failure is reported: domain and lookup
/// errors point at bad inputs or incomplete classification tables, engine
/// errors come from the raster collaborator and are never retried here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid input to a pure function
    Domain,
    /// A code or category has no entry in the table that should cover it
    Lookup,
    /// Failure reported by the raster/table engine
    ExternalEngine,
    Io,
    Other,
}

/// Main error type for covershift operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Category value {value} is outside the encodable range 0..{base}")]
    ValueOutOfRange { value: i64, base: i64 },

    #[error("Combined code {code} is outside the decodable range 0..{limit}")]
    CodeOutOfRange { code: i64, limit: i64 },

    #[error("Duplicate category value {value} in {slice} categories")]
    DuplicateCategory { value: i64, slice: TimeSlice },

    #[error("Category value {value} appears in both the start set and the end set")]
    OverlappingSets { value: i64 },

    #[error("Category set '{0}' is empty")]
    EmptySet(&'static str),

    #[error("Duplicate code {code} in frequency table")]
    DuplicateCode { code: i64 },

    #[error("Negative pixel count {count} for value {value}")]
    NegativeCount { value: i64, count: i64 },

    #[error("Cannot compute {what}: denominator pixel count is zero")]
    ZeroDenominator { what: String },

    #[error("Code {code} has no entry in the {table} table")]
    UnmappedCode { code: i64, table: &'static str },

    #[error("Category value {value} is not registered for the {slice} time slice")]
    UnknownCategory { value: i64, slice: TimeSlice },

    #[error("Field '{field}' not found in table '{table}'")]
    MissingField { field: String, table: String },

    #[error("Raster engine error: {0}")]
    Engine(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Which of the error families this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ValueOutOfRange { .. }
            | Error::CodeOutOfRange { .. }
            | Error::DuplicateCategory { .. }
            | Error::OverlappingSets { .. }
            | Error::EmptySet(_)
            | Error::DuplicateCode { .. }
            | Error::NegativeCount { .. }
            | Error::ZeroDenominator { .. }
            | Error::InvalidParameter { .. } => ErrorKind::Domain,
            Error::UnmappedCode { .. }
            | Error::UnknownCategory { .. }
            | Error::MissingField { .. } => ErrorKind::Lookup,
            Error::Engine(_) => ErrorKind::ExternalEngine,
            Error::Io(_) => ErrorKind::Io,
            Error::InvalidDimensions { .. }
            | Error::IndexOutOfBounds { .. }
            | Error::SizeMismatch { .. }
            | Error::Other(_) => ErrorKind::Other,
        }
    }
}

/// Result type alias for covershift operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::ValueOutOfRange { value: 100, base: 100 }.kind(), ErrorKind::Domain);
        assert_eq!(
            Error::ZeroDenominator { what: "percent".into() }.kind(),
            ErrorKind::Domain
        );
        assert_eq!(
            Error::UnmappedCode { code: 4141, table: "six-class" }.kind(),
            ErrorKind::Lookup
        );
        assert_eq!(Error::Engine("disk full".into()).kind(), ErrorKind::ExternalEngine);
    }

    #[test]
    fn test_error_messages_name_the_code() {
        let e = Error::UnmappedCode { code: 9504, table: "collapse" };
        assert_eq!(e.to_string(), "Code 9504 has no entry in the collapse table");
    }
}
