//! Ordered, background cache writes.
//!
//! Every cache write issued by the shelf goes through a single worker task,
//! one at a time and in submission order. That gives the cache a single
//! writer (no two writes to the same record can interleave) and means a
//! mirror queued by an earlier read can never land on top of a later write.
//!
//! Writes run to completion even if whoever submitted them stops waiting.
//! Failures are logged here; only callers that wait for a write see them.

use bookshelf_cache::Repository;
use bookshelf_cache::error::{ErrorKind as CacheErrorKind, Result as CacheResult};
use bookshelf_model::Book;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
pub(crate) enum CacheWrite {
    /// Mirror server state. Later books with the same id overwrite earlier ones.
    Upsert(Vec<Book>),
    Delete(i64),
    /// Store and queue a book created offline.
    Pending(Book),
    /// Swap a pushed book's local record for the server's.
    Resolve { local_id: i64, server: Book },
    /// No-op; completes once everything queued before it has.
    Barrier,
}

struct Job {
    write: CacheWrite,
    done: Option<oneshot::Sender<CacheResult<()>>>,
}

#[derive(Debug, Clone)]
pub(crate) struct Mirror {
    tx: mpsc::UnboundedSender<Job>,
}

impl Mirror {
    /// Start the worker. It stops once every `Mirror` handle is dropped and
    /// the queue has drained.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub(crate) fn spawn(cache: Repository) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        tokio::spawn(async move {
            while let Some(Job { write, done }) = rx.recv().await {
                let result = apply(&cache, write).await;
                if let Some(done) = done {
                    // The submitter may have stopped waiting; that's fine.
                    _ = done.send(result);
                }
            }
            tracing::debug!("cache mirror stopped");
        });
        Self { tx }
    }

    /// Queue a write without waiting for it.
    pub(crate) fn submit(&self, write: CacheWrite) {
        if self.tx.send(Job { write, done: None }).is_err() {
            tracing::warn!("cache mirror is gone; dropping write");
        }
    }

    /// Queue a write and wait until it (and everything queued before it) has
    /// been applied.
    pub(crate) async fn apply(&self, write: CacheWrite) -> CacheResult<()> {
        let (done, result) = oneshot::channel();
        if self.tx.send(Job { write, done: Some(done) }).is_err() {
            exn::bail!(CacheErrorKind::Database);
        }
        match result.await {
            Ok(result) => result,
            Err(_) => exn::bail!(CacheErrorKind::Database),
        }
    }

    /// Wait until every write queued so far has been applied.
    pub(crate) async fn flush(&self) {
        _ = self.apply(CacheWrite::Barrier).await;
    }
}

async fn apply(cache: &Repository, write: CacheWrite) -> CacheResult<()> {
    match write {
        CacheWrite::Upsert(books) => {
            let mut outcome = Ok(());
            for book in &books {
                if let Err(error) = cache.upsert(book).await {
                    tracing::warn!(id = book.id, ?error, "failed to mirror book into cache");
                    outcome = Err(error);
                }
            }
            tracing::trace!(count = books.len(), "mirrored books into cache");
            outcome
        },
        CacheWrite::Delete(id) => cache
            .delete(id)
            .await
            .map(|removed| tracing::trace!(id, removed, "removed book from cache"))
            .inspect_err(|error| tracing::warn!(id, ?error, "failed to remove book from cache")),
        CacheWrite::Pending(book) => cache
            .insert_pending(&book)
            .await
            .inspect_err(|error| tracing::warn!(id = book.id, ?error, "failed to store offline book")),
        CacheWrite::Resolve { local_id, server } => cache
            .resolve_pending(local_id, &server)
            .await
            .inspect_err(|error| tracing::warn!(local_id, id = server.id, ?error, "failed to reconcile offline book")),
        CacheWrite::Barrier => Ok(()),
    }
}
