//! Error types for archive operations.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.
//! Provider failures during file cleanup are deliberately NOT represented
//! here: they are logged and recorded in a [`CleanupReport`](crate::CleanupReport)
//! instead of aborting the operation.

use derive_more::{Display, Error};

/// An archive error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of an archive failure.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A query or write via [`arsip_store::Repository`] failed.
    #[display("relational store operation failed")]
    Store,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            _ => false,
        }
    }
}
