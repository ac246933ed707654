use crate::error::{Error, ErrorKind};
use crate::models::BookRow;
use bookshelf_model::Book;
use exn::ResultExt;
use time::UtcDateTime;

/// A book created while offline that the server hasn't seen yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Pending {
    pub book: Book,
    pub queued_at: UtcDateTime,
}

#[derive(sqlx::FromRow)]
pub(crate) struct PendingRow {
    #[sqlx(flatten)]
    book: BookRow,
    queued_at: i64,
}
impl TryFrom<PendingRow> for Pending {
    type Error = Error;
    fn try_from(row: PendingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            book: row.book.try_into()?,
            queued_at: UtcDateTime::from_unix_timestamp(row.queued_at)
                .or_raise(|| ErrorKind::InvalidData("queue date"))?,
        })
    }
}
