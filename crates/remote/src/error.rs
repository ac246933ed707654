//! Remote Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A remote gateway error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for remote gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Callers that don't care *why* the server couldn't satisfy a request can
/// treat every variant as the same "network failed" signal.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The configured base URL (or a URL derived from it) is not valid.
    #[display("invalid url: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// Connection refused, DNS failure, timeout, ...
    #[display("server unreachable")]
    Unreachable,
    /// The server answered with a non-2xx status code.
    #[display("server responded with status {_0}")]
    Status(#[error(not(source))] u16),
    /// The response body couldn't be decoded as the expected shape.
    #[display("invalid response body")]
    InvalidResponse,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unreachable => true,
            Self::Status(status) => *status >= 500,
            Self::InvalidUrl(_) | Self::InvalidResponse => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Unreachable, true)]
    #[case(ErrorKind::Status(503), true)]
    #[case(ErrorKind::Status(500), true)]
    #[case(ErrorKind::Status(404), false)]
    #[case(ErrorKind::Status(409), false)]
    #[case(ErrorKind::InvalidResponse, false)]
    #[case(ErrorKind::InvalidUrl("nope".to_string()), false)]
    fn test_is_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }
}
