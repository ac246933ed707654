use crate::change::Change;
use crate::error::{ErrorKind, Result};
use crate::shelf::Shelf;
use bookshelf_model::Book;
use exn::ResultExt;
use tracing::instrument;

impl Shelf {
    /// Apply a change pushed by the server, e.g. over a websocket.
    ///
    /// The payload is a single book as JSON, in the same shape the server
    /// returns it. The book is mirrored into the cache and broadcast to
    /// [subscribers](Self::subscribe) as [`Change::Upserted`]. How the payload
    /// arrives is up to the caller.
    #[instrument(skip_all)]
    pub async fn apply_notification(&self, payload: &str) -> Result<Book> {
        let book: Book = serde_json::from_str(payload).or_raise(|| ErrorKind::InvalidNotification)?;
        tracing::debug!(id = book.id, "received change notification");
        self.mirror_and_wait(&book).await;
        self.publish(Change::Upserted(book.clone()));
        Ok(book)
    }
}
