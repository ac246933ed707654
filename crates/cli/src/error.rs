//! CLI Error Types

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// Which layer the command failed in; the error tree has the details.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("invalid bookshelf server address")]
    Remote,
    #[display("local cache failure")]
    Cache,
    #[display("command failed")]
    Command,
}

impl ErrorKind {
    /// Returns `true` if running the same command again might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Cache | Self::Command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Config, false)]
    #[case(ErrorKind::Remote, false)]
    #[case(ErrorKind::Cache, true)]
    #[case(ErrorKind::Command, true)]
    fn test_is_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }
}
