//! Error types for the binja-core library.
//!
//! Decode failures are reported with enough detail (operation, offset, width,
//! buffer length) for a template author to locate the offending expression.

use crate::decoder::Operation;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for binja operations
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all binja operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Requested byte range falls outside the buffer
    #[error("range out of bounds: {length} byte(s) at offset {offset}, buffer holds {available}")]
    OutOfRange {
        /// Requested start offset
        offset: i64,
        /// Requested number of bytes
        length: i64,
        /// Length of the buffer
        available: usize,
    },

    /// Wrong number of arguments for a decode operation
    #[error("{operation} requires {signature}, got {actual} argument(s)")]
    Arity {
        /// The operation that was called
        operation: Operation,
        /// Human-readable argument signature
        signature: &'static str,
        /// Number of arguments supplied
        actual: usize,
    },

    /// A numeric argument could not be parsed
    #[error("{operation}: argument {position} ('{value}') is not a valid integer")]
    ArgumentParse {
        /// The operation that was called
        operation: Operation,
        /// Zero-based argument position
        position: usize,
        /// The raw argument text
        value: String,
    },

    /// Bytes are not valid in the requested text encoding
    #[error("bytes at offset {offset} (length {length}) are not valid {encoding}")]
    Decode {
        /// Canonical encoding name
        encoding: &'static str,
        /// Start offset of the string
        offset: i64,
        /// Length of the string in bytes
        length: i64,
    },

    /// Named text encoding is not known
    #[error("unsupported encoding: '{name}'")]
    UnsupportedEncoding {
        /// The encoding label as supplied
        name: String,
    },

    /// Name does not belong to the decode catalogue
    #[error("unknown operation: '{name}'")]
    UnknownOperation {
        /// The name as supplied
        name: String,
    },

    /// Template loading or rendering failed
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Failed to parse a JSON document
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// JSON document does not have the expected shape
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Invalid JSONPath expression
    #[error("invalid JSONPath expression: {0}")]
    JsonPath(#[from] serde_json_path::ParseError),

    /// JSONPath expression selected no nodes
    #[error("JSONPath expression '{expression}' matched nothing")]
    NoMatch {
        /// The expression as supplied
        expression: String,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new out-of-range error
    pub fn out_of_range(offset: i64, length: i64, available: usize) -> Self {
        Self::OutOfRange {
            offset,
            length,
            available,
        }
    }

    /// Creates a new unsupported encoding error
    pub fn unsupported_encoding(name: impl Into<String>) -> Self {
        Self::UnsupportedEncoding { name: name.into() }
    }

    /// Creates a new invalid document error
    pub fn invalid_document(msg: impl Into<String>) -> Self {
        Self::InvalidDocument(msg.into())
    }

    /// Returns true if this error was raised by a decode call rather than I/O
    /// or template machinery
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            Self::OutOfRange { .. }
                | Self::Arity { .. }
                | Self::ArgumentParse { .. }
                | Self::Decode { .. }
                | Self::UnsupportedEncoding { .. }
                | Self::UnknownOperation { .. }
        )
    }
}
