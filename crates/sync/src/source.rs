use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Which side answered a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Source {
    Network,
    /// The network failed; this is whatever the cache last saw.
    Local,
}
impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Network => "NETWORK",
            Source::Local => "LOCAL",
        }
    }
}
impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// A payload tagged with its [`Source`].
///
/// An empty list tagged [`Source::Local`] is a valid answer; "nothing found"
/// is reported as an error instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub data: T,
    pub source: Source,
}
impl<T> Sourced<T> {
    pub fn network(data: T) -> Self {
        Self { data, source: Source::Network }
    }

    pub fn local(data: T) -> Self {
        Self { data, source: Source::Local }
    }

    pub fn is_local(&self) -> bool {
        self.source == Source::Local
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced { data: f(self.data), source: self.source }
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}
