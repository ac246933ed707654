use crate::change::Change;
use crate::error::{ErrorKind, Result};
use crate::mirror::{CacheWrite, Mirror};
use crate::source::Sourced;
use bookshelf_cache::Repository;
use bookshelf_model::Book;
use bookshelf_remote::GatewayHandle;
use exn::ResultExt;
use tokio::sync::broadcast;
use tracing::instrument;

/// Plenty for a UI that redraws on every change; slow subscribers skip ahead.
const CHANGE_CAPACITY: usize = 256;

/// Whether the device currently believes it has a connection.
///
/// Detection belongs to the platform; the shelf only branches on the value
/// it is handed at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}
impl From<bool> for Connectivity {
    /// `true` means connected.
    fn from(connected: bool) -> Self {
        if connected { Self::Online } else { Self::Offline }
    }
}

enum Listing {
    Books,
    AllPages,
}

/// Network-first, cache-fallback access to books.
///
/// # Reads
/// The network is always tried first. On success, every returned book is
/// mirrored into the cache in the background (the read doesn't wait for it,
/// and a failed mirror only shows up in the logs) and the result is tagged
/// [`Source::Network`](crate::Source::Network). On failure, the cache
/// answers and the result is tagged [`Source::Local`](crate::Source::Local),
/// unless the cache has nothing to offer either, which is an error.
///
/// # Writes
/// Writes go to the network; a failure there fails the write. On success the
/// server's copy is mirrored, and the write returns once the mirror has
/// landed so that an immediate cache read sees it. The only write that can
/// happen without the network is [`create()`](Self::create) while
/// [`Connectivity::Offline`].
///
/// Operations are independent and may run concurrently; no ordering is
/// promised between a read and a write that overlap in time.
pub struct Shelf {
    pub(crate) remote: GatewayHandle,
    pub(crate) cache: Repository,
    pub(crate) mirror: Mirror,
    changes: broadcast::Sender<Change>,
}

impl Shelf {
    /// # Panics
    /// Must be called from within a Tokio runtime; the cache mirror runs as
    /// a background task.
    pub fn new(remote: GatewayHandle, cache: Repository) -> Self {
        let mirror = Mirror::spawn(cache.clone());
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self { remote, cache, mirror, changes }
    }

    /// Direct access to the local cache, bypassing the network.
    pub fn cache(&self) -> &Repository {
        &self.cache
    }

    /// Receive every [`Change`] made through this shelf from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }

    pub(crate) fn publish(&self, change: Change) {
        // No subscribers is not an error.
        _ = self.changes.send(change);
    }

    /// Wait until every cache mirror queued so far has been written.
    pub async fn flush(&self) {
        self.mirror.flush().await;
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All books (`GET /books`), or every cached book if the network fails.
    pub async fn get_all(&self) -> Result<Sourced<Vec<Book>>> {
        self.list(Listing::Books).await
    }

    /// All books across every page (`GET /allBooks`), or every cached book if
    /// the network fails.
    pub async fn get_all_paged(&self) -> Result<Sourced<Vec<Book>>> {
        self.list(Listing::AllPages).await
    }

    #[instrument(skip_all, fields(gateway = self.remote.name()))]
    async fn list(&self, listing: Listing) -> Result<Sourced<Vec<Book>>> {
        let fetched = match listing {
            Listing::Books => self.remote.get_all().await,
            Listing::AllPages => self.remote.get_all_paged().await,
        };
        let error = match fetched {
            Ok(books) => {
                tracing::debug!(count = books.len(), "fetched books from network");
                self.mirror.submit(CacheWrite::Upsert(books.clone()));
                return Ok(Sourced::network(books));
            },
            Err(error) => error,
        };
        tracing::info!(?error, "network request failed, falling back to local cache");
        // Reads issued just before the outage may still be mirroring.
        self.mirror.flush().await;
        let books = self.cache.get_all().await.or_raise(|| ErrorKind::Cache)?;
        if books.is_empty() {
            tracing::info!("no books in local cache");
            return Err(error.raise(ErrorKind::NoLocalData));
        }
        Ok(Sourced::local(books))
    }

    /// A single book (`GET /book/{id}`), or the cached copy if the network fails.
    #[instrument(skip(self), fields(gateway = self.remote.name()))]
    pub async fn get(&self, id: i64) -> Result<Sourced<Book>> {
        let error = match self.remote.get(id).await {
            Ok(book) => {
                self.mirror.submit(CacheWrite::Upsert(vec![book.clone()]));
                return Ok(Sourced::network(book));
            },
            Err(error) => error,
        };
        tracing::info!(?error, "network request failed, falling back to local cache");
        self.mirror.flush().await;
        match self.cache.get(id).await.or_raise(|| ErrorKind::Cache)? {
            Some(book) => Ok(Sourced::local(book)),
            None => {
                tracing::info!("book not in local cache");
                Err(error.raise(ErrorKind::NotFound(id)))
            },
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Create a book.
    ///
    /// Online, the server assigns the id and its copy is returned (tagged
    /// [`Source::Network`](crate::Source::Network)); a network failure fails
    /// the create and nothing is stored locally.
    ///
    /// Offline, the book is stored in the cache exactly as given and queued
    /// for [`sync_pending()`](Self::sync_pending). The caller picks the id,
    /// which must be a local (negative) one, see
    /// [`Repository::next_local_id`]. The network is not touched and the
    /// result is tagged [`Source::Local`](crate::Source::Local).
    #[instrument(skip_all, fields(gateway = self.remote.name(), connectivity = ?connectivity))]
    pub async fn create(&self, book: &Book, connectivity: Connectivity) -> Result<Sourced<Book>> {
        match connectivity {
            Connectivity::Online => {
                let created = self.remote.create(book).await.or_raise(|| ErrorKind::Network)?;
                tracing::debug!(id = created.id, "created book");
                self.mirror_and_wait(&created).await;
                self.publish(Change::Upserted(created.clone()));
                Ok(Sourced::network(created))
            },
            Connectivity::Offline => {
                // A server id would overwrite that book's mirror and be
                // dropped from the cache once pushed.
                if !book.is_local() {
                    exn::bail!(ErrorKind::NotLocal(book.id));
                }
                self.mirror.apply(CacheWrite::Pending(book.clone())).await.or_raise(|| ErrorKind::Cache)?;
                tracing::debug!(id = book.id, "stored book for later sync");
                self.publish(Change::Upserted(book.clone()));
                Ok(Sourced::local(book.clone()))
            },
        }
    }

    /// Update a book on the server and mirror the server's copy.
    #[instrument(skip_all, fields(gateway = self.remote.name(), id = book.id))]
    pub async fn update(&self, book: &Book) -> Result<Book> {
        let updated = self.remote.update(book).await.or_raise(|| ErrorKind::Network)?;
        self.mirror_and_wait(&updated).await;
        self.publish(Change::Upserted(updated.clone()));
        Ok(updated)
    }

    /// Delete a book on the server, then from the cache.
    ///
    /// If the server delete fails, the cache is left untouched: the book
    /// still exists as far as anyone knows.
    #[instrument(skip(self), fields(gateway = self.remote.name()))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.remote.delete(id).await.or_raise(|| ErrorKind::Network)?;
        // Removing a record that was never cached is fine; a failure is
        // already logged by the mirror.
        _ = self.mirror.apply(CacheWrite::Delete(id)).await;
        self.publish(Change::Deleted(id));
        Ok(())
    }

    /// Mirror a book the server just returned and wait for it to land.
    /// A failure is logged by the mirror and otherwise ignored.
    pub(crate) async fn mirror_and_wait(&self, book: &Book) {
        _ = self.mirror.apply(CacheWrite::Upsert(vec![book.clone()])).await;
    }
}
