use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Conventional status for books that are currently being read.
pub const READING: &str = "reading";

/// A book record.
///
/// The identifier is the only key; every other field is mutable. Records
/// created by the server carry a server-assigned id, records created while
/// offline carry a locally reserved (negative) id until they are pushed.
///
/// Field names are serialized in camelCase to match the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: String,
    /// Free-form, but conventionally one of a small set including [`READING`].
    pub status: String,
    pub review_count: u32,
    /// Average rating, typically between 0 and 5.
    pub avg_rating: f64,
}
impl Book {
    pub fn new(
        id: i64,
        title: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
            status: status.into(),
            review_count: 0,
            avg_rating: 0.0,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    pub fn with_reviews(mut self, review_count: u32, avg_rating: f64) -> Self {
        self.review_count = review_count;
        self.avg_rating = avg_rating;
        self
    }

    /// Whether the id was reserved locally (offline creation) rather than
    /// assigned by the server.
    pub fn is_local(&self) -> bool {
        self.id < 0
    }

    pub fn is_reading(&self) -> bool {
        self.status.eq_ignore_ascii_case(READING)
    }
}

impl Display for Book {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} by {}", self.title, self.author)
    }
}
