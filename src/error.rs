//! Error types for arraystore
//!
//! Two layers:
//! - [`BackendError`]: failures raised by the container file, tagged with
//!   the part of the container that failed ([`ErrorCause`])
//! - [`StoreError`]: what the [`Store`](crate::Store) façade reports to
//!   callers, wrapping backend failures and adding semantic rejections

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::container::DataType;
use crate::store::Mode;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Which part of the backing container rejected an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCause {
    /// Opening, writing to or reading from the file itself
    File,
    /// Creating, locating or decoding a named record
    Dataset,
    /// Extents and element counts
    Dataspace,
    /// Element types
    Datatype,
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorCause::File => "file",
            ErrorCause::Dataset => "dataset",
            ErrorCause::Dataspace => "dataspace",
            ErrorCause::Datatype => "datatype",
        })
    }
}

/// Failure raised by the backing container
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("file error: {message}")]
    File {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("dataspace error: {0}")]
    Dataspace(String),

    #[error("datatype error: {0}")]
    Datatype(String),
}

impl BackendError {
    /// File-level error wrapping an I/O failure
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        BackendError::File {
            message: message.into(),
            source: Some(source),
        }
    }

    /// File-level error with no underlying I/O failure
    pub fn file(message: impl Into<String>) -> Self {
        BackendError::File {
            message: message.into(),
            source: None,
        }
    }

    /// The category of this failure
    pub fn cause(&self) -> ErrorCause {
        match self {
            BackendError::File { .. } => ErrorCause::File,
            BackendError::Dataset(_) => ErrorCause::Dataset,
            BackendError::Dataspace(_) => ErrorCause::Dataspace,
            BackendError::Datatype(_) => ErrorCause::Datatype,
        }
    }
}

/// Unified error type for Store operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: BackendError,
    },

    #[error("cannot close {}: {source}", path.display())]
    Close {
        path: PathBuf,
        #[source]
        source: BackendError,
    },

    #[error("{operation} is not allowed on a store opened in {mode} mode")]
    WrongMode { operation: &'static str, mode: Mode },

    // -------------------------------------------------------------------------
    // Write Errors
    // -------------------------------------------------------------------------
    #[error("failed to write dataset '{name}': {source}")]
    Write {
        name: String,
        #[source]
        source: BackendError,
    },

    // -------------------------------------------------------------------------
    // Read Errors
    // -------------------------------------------------------------------------
    #[error("failed to read dataset '{name}': {source}")]
    Read {
        name: String,
        #[source]
        source: BackendError,
    },

    #[error("dataset '{0}' not found")]
    NotFound(String),

    #[error("dataset '{name}' has element type {found}, expected f64 little-endian")]
    TypeMismatch { name: String, found: DataType },

    #[error("dataset '{name}' has rank {rank}, expected 1")]
    ShapeMismatch { name: String, rank: usize },
}

impl StoreError {
    /// Backend cause category, if this error came from the container
    pub fn cause(&self) -> Option<ErrorCause> {
        match self {
            StoreError::Open { source, .. }
            | StoreError::Close { source, .. }
            | StoreError::Write { source, .. }
            | StoreError::Read { source, .. } => Some(source.cause()),
            _ => None,
        }
    }
}
