//! Error types for the log2txt library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Log2TxtError`] — **Fatal** for the operation that returned it: the
//!   request cannot be satisfied (too few inputs, unknown artifact, storage
//!   unavailable). Returned as `Err(Log2TxtError)` from every
//!   [`crate::service::LogService`] operation.
//!
//! * [`FileError`] — **Per-file**: one upload in a conversion batch failed.
//!   Delivered to [`crate::progress::ConversionProgressCallback::on_file_error`]
//!   before the batch aborts, so a progress display can say *which* file broke.
//!
//! Every fatal error maps onto one of three [`ErrorKind`]s, which in turn map
//! onto an HTTP status code. Nothing in the library retries or rolls back:
//! the caller sees the failure and decides whether to re-invoke.

use thiserror::Error;

/// All fatal errors returned by the log2txt library.
#[derive(Debug, Error)]
pub enum Log2TxtError {
    // ── Caller errors ─────────────────────────────────────────────────────
    /// The caller supplied too few inputs or a malformed request.
    #[error("{0}")]
    Validation(String),

    /// A referenced artifact, download or storage area does not exist.
    #[error("File not found: '{name}'")]
    NotFound { name: String },

    // ── Storage errors ────────────────────────────────────────────────────
    /// Reading, writing, listing or deleting in storage failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The zip writer rejected an entry or could not finalise the archive.
    #[error("Failed to build archive: {0}")]
    Archive(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a blocking task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Log2TxtError {
    /// Create an IO error with a human-readable context.
    pub(crate) fn io(context: impl std::fmt::Display, source: std::io::Error) -> Self {
        Log2TxtError::Io {
            context: context.to_string(),
            source,
        }
    }

    pub(crate) fn not_found(name: impl Into<String>) -> Self {
        Log2TxtError::NotFound { name: name.into() }
    }

    /// Classify the error for the caller.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Log2TxtError::Validation(_) | Log2TxtError::InvalidConfig(_) => ErrorKind::Validation,
            Log2TxtError::NotFound { .. } => ErrorKind::NotFound,
            Log2TxtError::Io { .. } | Log2TxtError::Archive(_) | Log2TxtError::Internal(_) => {
                ErrorKind::Io
            }
        }
    }
}

/// Status-like classification of a [`Log2TxtError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ErrorKind {
    /// Too few inputs or a malformed request body.
    Validation,
    /// Referenced artifact or requested download absent.
    NotFound,
    /// Underlying storage unavailable or a read/write failed.
    Io,
}

impl ErrorKind {
    /// HTTP status code equivalent.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Io => 500,
        }
    }
}

/// A per-file error inside a conversion batch.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// The upload carried no usable file name.
    #[error("File {index}: unusable file name '{name}'")]
    BadName { index: usize, name: String },

    /// The converted text could not be written to storage.
    #[error("File {index} ('{name}'): write failed: {detail}")]
    WriteFailed {
        index: usize,
        name: String,
        detail: String,
    },
}
