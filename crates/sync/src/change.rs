use bookshelf_model::Book;

/// Something about the shelf changed.
///
/// Broadcast to every [`subscriber`](crate::Shelf::subscribe) after the
/// change has reached the local cache.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// A book was created or updated, by this client or (via a push
    /// notification) by someone else.
    Upserted(Book),
    Deleted(i64),
    /// A book created offline was accepted by the server under a new id.
    Reconciled { local_id: i64, book: Book },
}
