//! Error taxonomy for the generation engine.
//!
//! Only configuration, overflow and (when requested) all-or-nothing
//! collaborator failures abort a call. Malformed templates and fingerprint
//! collisions are reported as warnings in the batch metadata instead.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a generation request.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request cannot be served as configured.
    #[error("Invalid configuration: {message}")]
    Configuration { message: String },

    /// The product of dimension sizes does not fit in a `u64`.
    #[error("Combination space overflows u64 at dimension '{dimension}'")]
    ArithmeticOverflow { dimension: String },

    /// A dimension source failed while `all_or_nothing` was requested.
    #[error("Collaborator failed at index {index}: {source}")]
    Collaborator {
        index: u64,
        #[source]
        source: SourceError,
    },

    /// The uniqueness ledger failed while `all_or_nothing` was requested.
    #[error("Ledger failed at index {index}: {source}")]
    Ledger {
        index: u64,
        #[source]
        source: LedgerError,
    },

    /// A generation worker stopped unexpectedly.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        EngineError::Configuration {
            message: message.into(),
        }
    }
}

/// Errors raised by a dimension source lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Dimension '{dimension}' has no option at index {index}")]
    NotFound { dimension: String, index: u64 },

    #[error("Dimension '{dimension}' unavailable: {message}")]
    Unavailable { dimension: String, message: String },
}

/// Errors raised by a uniqueness ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Ledger file '{path}' is locked by another process")]
    Locked { path: PathBuf },

    #[error("Ledger file '{path}' line {line} is not a fingerprint")]
    Corrupt { path: PathBuf, line: usize },
}
