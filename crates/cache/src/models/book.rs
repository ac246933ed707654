use crate::error::{Error, ErrorKind};
use bookshelf_model::Book;
use exn::ResultExt;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookRow {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) genre: String,
    pub(crate) status: String,
    pub(crate) review_count: i64,
    pub(crate) avg_rating: f64,
}
impl From<&Book> for BookRow {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone(),
            status: book.status.clone(),
            review_count: i64::from(book.review_count),
            avg_rating: book.avg_rating,
        }
    }
}
impl TryFrom<BookRow> for Book {
    type Error = Error;
    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            author: row.author,
            genre: row.genre,
            status: row.status,
            review_count: u32::try_from(row.review_count).or_raise(|| ErrorKind::InvalidData("review count"))?,
            avg_rating: row.avg_rating,
        })
    }
}
