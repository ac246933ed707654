//! Repository for cached books and the offline outbox.

use crate::db::{Database, Location};
use crate::error::{ErrorKind, Result};
use crate::models::{BookRow, Pending, PendingRow};
use bookshelf_model::Book;
use exn::{OptionExt, ResultExt};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool};
use std::sync::Arc;
use time::UtcDateTime;
use tokio::sync::OnceCell;

type UpsertQuery = Query<'static, Sqlite, SqliteArguments<'static>>;

/// Repository for managing books in the cache database.
///
/// Cloning is cheap; every clone shares the same underlying database handle.
///
/// # Lazy initialization
///
/// A repository created with [`Repository::lazy`] doesn't touch the disk
/// until the first query. The database is then opened (and migrated)
/// exactly once, even when several tasks race for it, and the handle is
/// reused for the lifetime of the repository.
#[derive(Debug, Clone)]
pub struct Repository {
    db: Arc<OnceCell<Database>>,
    location: Location,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self {
            db: Arc::new(OnceCell::new_with(Some(db.clone()))),
            location: db.location().clone(),
        }
    }
}
impl Repository {
    /// Create a repository that opens the database on first use.
    pub fn lazy(location: impl Into<Location>) -> Self {
        Self { db: Arc::new(OnceCell::new()), location: location.into() }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Whether the underlying database has been opened yet.
    pub fn is_open(&self) -> bool {
        self.db.initialized()
    }

    async fn pool(&self) -> Result<&SqlitePool> {
        let db = self.db.get_or_try_init(|| Database::open(&self.location)).await?;
        Ok(db.pool())
    }

    /// Close the database, if it was ever opened.
    pub async fn close(&self) {
        if let Some(db) = self.db.get() {
            db.close().await;
        }
    }

    fn upsert_query(book: &Book) -> UpsertQuery {
        let row = BookRow::from(book);
        sqlx::query(include_str!("../queries/upsert_book.sql"))
            .bind(row.id)
            .bind(row.title)
            .bind(row.author)
            .bind(row.genre)
            .bind(row.status)
            .bind(row.review_count)
            .bind(row.avg_rating)
    }

    // =========================================================================
    // Get/List
    // =========================================================================

    /// Every cached book, ordered by id. An empty cache is not an error.
    pub async fn get_all(&self) -> Result<Vec<Book>> {
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../queries/list_books.sql"))
            .fetch_all(self.pool().await?)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Book::try_from).collect()
    }

    /// Get a single book; `None` when the id isn't cached.
    pub async fn get(&self, id: i64) -> Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as(include_str!("../queries/get_book.sql"))
            .bind(id)
            .fetch_optional(self.pool().await?)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Book::try_from).transpose()
    }

    // =========================================================================
    // Insert/Update/Delete
    // =========================================================================

    /// Insert the book, or overwrite every field of the book with the same id.
    ///
    /// The existence check and the write happen in a single statement, so
    /// there is no point in time where neither has happened.
    pub async fn upsert(&self, book: &Book) -> Result<()> {
        Self::upsert_query(book).execute(self.pool().await?).await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Delete a book by id.
    ///
    /// Returns `true` if a record was removed; deleting an id that isn't
    /// cached is not an error. Any outbox entry for the id goes with it.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/delete_book.sql"))
            .bind(id)
            .execute(self.pool().await?)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Outbox
    // =========================================================================

    /// A fresh id for a book created offline.
    ///
    /// Local ids are negative so they can never collide with ids handed out
    /// by the server.
    pub async fn next_local_id(&self) -> Result<i64> {
        let min: Option<i64> = sqlx::query_scalar(include_str!("../queries/min_book_id.sql"))
            .fetch_one(self.pool().await?)
            .await
            .or_raise(|| ErrorKind::Database)?;
        min.unwrap_or(0).min(0).checked_sub(1).ok_or_raise(|| ErrorKind::InvalidData("local id"))
    }

    /// Store a book created offline and queue it for pushing to the server.
    pub async fn insert_pending(&self, book: &Book) -> Result<()> {
        let mut tx = self.pool().await?.begin().await.or_raise(|| ErrorKind::Database)?;
        Self::upsert_query(book).execute(&mut *tx).await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/queue_pending.sql"))
            .bind(book.id)
            .bind(UtcDateTime::now().unix_timestamp())
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Books waiting to be pushed, oldest first.
    pub async fn list_pending(&self) -> Result<Vec<Pending>> {
        let rows: Vec<PendingRow> = sqlx::query_as(include_str!("../queries/list_pending.sql"))
            .fetch_all(self.pool().await?)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Pending::try_from).collect()
    }

    /// Replace a pushed book's local record with the server's version.
    ///
    /// Removes the local id (and its outbox entry) and stores `server` in a
    /// single transaction.
    pub async fn resolve_pending(&self, local_id: i64, server: &Book) -> Result<()> {
        let mut tx = self.pool().await?.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/delete_book.sql"))
            .bind(local_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Self::upsert_query(server).execute(&mut *tx).await.or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    async fn repo() -> Repository {
        Repository::from(&Database::connect_in_memory().await.unwrap())
    }

    fn book(id: i64, title: &str) -> Book {
        Book::new(id, title, "Ursula K. Le Guin", "Fantasy", "reading").with_reviews(3, 4.25)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = repo().await;
        repo.upsert(&book(1, "A Wizard of Earthsea")).await.unwrap();
        assert_eq!(repo.get(1).await.unwrap(), Some(book(1, "A Wizard of Earthsea")));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let repo = repo().await;
        assert_eq!(repo.get(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_all_empty() {
        let repo = repo().await;
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_all_ordered_by_id() {
        let repo = repo().await;
        for id in [3, -1, 2] {
            repo.upsert(&book(id, "Title")).await.unwrap();
        }
        let ids: Vec<i64> = repo.get_all().await.unwrap().into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![-1, 2, 3]);
    }

    #[tokio::test]
    async fn test_upsert_updates_every_field() {
        let repo = repo().await;
        repo.upsert(&book(1, "Old")).await.unwrap();
        let updated = Book::new(1, "New", "Other", "Sci-Fi", "read").with_reviews(99, 1.5);
        repo.upsert(&updated).await.unwrap();
        assert_eq!(repo.get(1).await.unwrap(), Some(updated));
        assert_eq!(repo.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let repo = repo().await;
        repo.upsert(&book(5, "Same")).await.unwrap();
        let once = repo.get_all().await.unwrap();
        repo.upsert(&book(5, "Same")).await.unwrap();
        assert_eq!(repo.get_all().await.unwrap(), once);
    }

    #[rstest]
    #[case::present(true)]
    #[case::absent(false)]
    #[tokio::test]
    async fn test_delete(#[case] present: bool) {
        let repo = repo().await;
        if present {
            repo.upsert(&book(7, "Doomed")).await.unwrap();
        }
        assert_eq!(repo.delete(7).await.unwrap(), present);
        assert_eq!(repo.get(7).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_next_local_id() {
        let repo = repo().await;
        assert_eq!(repo.next_local_id().await.unwrap(), -1);
        repo.upsert(&book(10, "Server")).await.unwrap();
        assert_eq!(repo.next_local_id().await.unwrap(), -1);
        repo.insert_pending(&book(-1, "Local")).await.unwrap();
        assert_eq!(repo.next_local_id().await.unwrap(), -2);
    }

    #[tokio::test]
    async fn test_next_local_id_exhausted() {
        let repo = repo().await;
        repo.upsert(&book(i64::MIN, "Bottom")).await.unwrap();
        let err = repo.next_local_id().await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_pending_round_trip() {
        let repo = repo().await;
        repo.insert_pending(&book(-1, "First")).await.unwrap();
        repo.insert_pending(&book(-2, "Second")).await.unwrap();
        // Queuing the same id again doesn't duplicate it.
        repo.insert_pending(&book(-1, "First, edited")).await.unwrap();
        let pending = repo.list_pending().await.unwrap();
        let titles: Vec<&str> = pending.iter().map(|p| p.book.title.as_str()).collect();
        assert_eq!(titles, vec!["First, edited", "Second"]);
        assert_eq!(repo.get(-1).await.unwrap().map(|b| b.title), Some("First, edited".to_string()));
    }

    #[tokio::test]
    async fn test_resolve_pending_swaps_ids() {
        let repo = repo().await;
        repo.insert_pending(&book(-1, "Offline")).await.unwrap();
        repo.resolve_pending(-1, &book(31, "Offline")).await.unwrap();
        assert_eq!(repo.get(-1).await.unwrap(), None);
        assert_eq!(repo.get(31).await.unwrap(), Some(book(31, "Offline")));
        assert!(repo.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_outbox_entry() {
        let repo = repo().await;
        repo.insert_pending(&book(-1, "Offline")).await.unwrap();
        assert!(repo.delete(-1).await.unwrap());
        assert!(repo.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mirroring_does_not_dequeue() {
        let repo = repo().await;
        repo.insert_pending(&book(-1, "Offline")).await.unwrap();
        repo.upsert(&book(-1, "Offline, renamed")).await.unwrap();
        assert_eq!(repo.list_pending().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lazy_opens_on_first_use() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.db");
        let repo = Repository::lazy(path.clone());
        assert!(!repo.is_open());
        assert!(!path.exists());

        repo.upsert(&book(1, "Persisted")).await.unwrap();
        assert!(repo.is_open());
        assert!(path.exists());

        // Clones share the handle.
        let clone = repo.clone();
        assert!(clone.is_open());
        assert_eq!(clone.get(1).await.unwrap(), Some(book(1, "Persisted")));
        repo.close().await;

        let reopened = Repository::lazy(path);
        assert_eq!(reopened.get(1).await.unwrap(), Some(book(1, "Persisted")));
        reopened.close().await;
    }

    #[tokio::test]
    async fn test_lazy_in_memory_is_shared() {
        let repo = Repository::lazy(Location::Memory);
        let (one, two) = (book(1, "One"), book(2, "Two"));
        let (a, b) = tokio::join!(repo.upsert(&one), repo.upsert(&two));
        a.unwrap();
        b.unwrap();
        assert_eq!(repo.get_all().await.unwrap().len(), 2);
    }
}
