//! Books created offline, waiting for the server.

use crate::change::Change;
use crate::error::{ErrorKind, Result};
use crate::mirror::CacheWrite;
use crate::shelf::Shelf;
use bookshelf_cache::Pending;
use bookshelf_model::Book;
use exn::ResultExt;
use tracing::instrument;

/// A book the server accepted during [`Shelf::sync_pending`].
#[derive(Debug, Clone, PartialEq)]
pub struct Pushed {
    /// The id the book had locally (always negative).
    pub local_id: i64,
    /// The server's copy, with its server-assigned id.
    pub book: Book,
}

/// Outcome of a [`Shelf::sync_pending`] run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub pushed: Vec<Pushed>,
    /// Books still queued because the run stopped early.
    pub remaining: usize,
}
impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

impl Shelf {
    /// Books created offline and not yet pushed, oldest first.
    pub async fn pending(&self) -> Result<Vec<Pending>> {
        self.mirror.flush().await;
        self.cache.list_pending().await.or_raise(|| ErrorKind::Cache)
    }

    /// Push every queued offline book to the server, oldest first.
    ///
    /// Each accepted book replaces its local record with the server's copy.
    /// The run stops at the first network failure and reports what is left;
    /// books already pushed stay pushed. Calling it with nothing queued makes
    /// no network requests.
    #[instrument(skip_all, fields(gateway = self.remote.name()))]
    pub async fn sync_pending(&self) -> Result<SyncReport> {
        let queued = self.pending().await?;
        let total = queued.len();
        let mut report = SyncReport::default();
        for Pending { book, .. } in queued {
            let created = match self.remote.create(&book).await {
                Ok(created) => created,
                Err(error) => {
                    tracing::info!(id = book.id, ?error, "server unavailable, stopping sync");
                    break;
                },
            };
            tracing::debug!(local_id = book.id, id = created.id, "pushed offline book");
            // The server has the book now; a failure here would only cause a
            // duplicate push on the next run, so stop rather than carry on.
            self.mirror
                .apply(CacheWrite::Resolve { local_id: book.id, server: created.clone() })
                .await
                .or_raise(|| ErrorKind::Cache)?;
            self.publish(Change::Reconciled { local_id: book.id, book: created.clone() });
            report.pushed.push(Pushed { local_id: book.id, book: created });
        }
        report.remaining = total - report.pushed.len();
        tracing::info!(pushed = report.pushed.len(), remaining = report.remaining, "offline sync finished");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Connectivity;
    use bookshelf_cache::{Database, Repository};
    use bookshelf_remote::gateway::MockGateway;
    use std::sync::Arc;

    fn book(id: i64, title: &str) -> Book {
        Book::new(id, title, "Octavia E. Butler", "Science Fiction", "to read")
    }

    async fn shelf(books: impl IntoIterator<Item = Book>) -> (Shelf, Arc<MockGateway>) {
        let gateway = Arc::new(MockGateway::with_books(books));
        let cache = Repository::from(&Database::connect_in_memory().await.unwrap());
        (Shelf::new(gateway.clone(), cache), gateway)
    }

    #[tokio::test]
    async fn test_nothing_queued_makes_no_requests() {
        let (shelf, gateway) = shelf([]).await;
        let report = shelf.sync_pending().await.unwrap();
        assert_eq!(report, SyncReport::default());
        assert!(report.is_complete());
        assert_eq!(gateway.requests(), 0);
    }

    #[tokio::test]
    async fn test_pushes_and_reconciles() {
        let (shelf, gateway) = shelf([book(7, "Kindred")]).await;
        shelf.create(&book(-1, "Dawn"), Connectivity::Offline).await.unwrap();
        shelf.create(&book(-2, "Wild Seed"), Connectivity::Offline).await.unwrap();
        assert_eq!(shelf.pending().await.unwrap().len(), 2);

        let mut changes = shelf.subscribe();
        let report = shelf.sync_pending().await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.pushed, vec![
            Pushed { local_id: -1, book: book(8, "Dawn") },
            Pushed { local_id: -2, book: book(9, "Wild Seed") },
        ]);
        assert_eq!(changes.recv().await.unwrap(), Change::Reconciled { local_id: -1, book: book(8, "Dawn") });

        assert!(shelf.pending().await.unwrap().is_empty());
        assert_eq!(shelf.cache().get(-1).await.unwrap(), None);
        assert_eq!(shelf.cache().get(8).await.unwrap(), Some(book(8, "Dawn")));
        assert_eq!(gateway.books().await.len(), 3);
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let (shelf, gateway) = shelf([]).await;
        shelf.create(&book(-1, "Parable of the Sower"), Connectivity::Offline).await.unwrap();
        gateway.set_online(false);

        let report = shelf.sync_pending().await.unwrap();
        assert!(report.pushed.is_empty());
        assert_eq!(report.remaining, 1);
        assert_eq!(shelf.pending().await.unwrap()[0].book, book(-1, "Parable of the Sower"));

        gateway.set_online(true);
        let report = shelf.sync_pending().await.unwrap();
        assert_eq!(report.pushed.len(), 1);
        assert!(report.is_complete());
    }
}
