//! Table construction errors.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for table construction.
pub type TableResult<T> = Result<T, TableError>;

/// Errors raised while building or loading a table.
///
/// All of these are startup failures; lookups never return them.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Cannot read table file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed table file {} (line {line}): {what}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        what: String,
    },

    #[error("Short read from {}: expected {expected} bytes, found {found}", .path.display())]
    ShortRead {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("Table file {} is {found} bytes, its grid needs exactly {expected}", .path.display())]
    TrailingBytes {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("Invalid table setup: {what}")]
    InvalidSetup { what: String },
}
