//! Sync Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A sync error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies why an operation couldn't be satisfied.
///
/// A user interface can treat all of these as "it didn't work"; the kinds
/// exist so logs and tests can tell them apart.
///
/// ### Terminal read failures
/// - [`ErrorKind::NoLocalData`] - the network failed and the cache is empty.
/// - [`ErrorKind::NotFound`] - the network failed and the cache doesn't know the id.
///
/// ### Dependency errors
/// - [`ErrorKind::Network`] - a write couldn't reach (or was refused by) the server.
/// - [`ErrorKind::Cache`] - the local cache failed where it was the primary store.
///
/// ### Caller errors
/// - [`ErrorKind::NotLocal`] - an offline create was given a server id.
/// - [`ErrorKind::InvalidNotification`] - a pushed payload wasn't a book.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("network request failed")]
    Network,
    #[display("no books available offline")]
    NoLocalData,
    #[display("book {_0} not found offline")]
    NotFound(#[error(not(source))] i64),
    #[display("local cache failure")]
    Cache,
    /// Books created offline need a local (negative) id.
    #[display("book {_0} does not have a local id")]
    NotLocal(#[error(not(source))] i64),
    /// A push notification payload wasn't a valid book.
    #[display("invalid change notification")]
    InvalidNotification,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::NoLocalData | Self::NotFound(_))
    }
}
