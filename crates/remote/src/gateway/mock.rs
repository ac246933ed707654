//! In-memory gateway for testing.

use crate::RemoteGateway;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use bookshelf_model::Book;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory stand-in for the bookshelf server.
///
/// Books are stored in a `BTreeMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. The gateway can
/// be switched offline, in which case every call fails as if the server was
/// unreachable. Every call is counted, online or not.
///
/// # Examples
///
/// ```
/// use bookshelf_model::Book;
/// use bookshelf_remote::{RemoteGateway, gateway::MockGateway};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = MockGateway::with_books([Book::new(1, "Beloved", "Toni Morrison", "Fiction", "read")]);
/// assert_eq!(gateway.get(1).await?.title, "Beloved");
///
/// gateway.set_online(false);
/// assert!(gateway.get(1).await.is_err());
/// assert_eq!(gateway.requests(), 2);
/// # Ok(())
/// # }
/// ```
pub struct MockGateway {
    name: String,
    books: RwLock<BTreeMap<i64, Book>>,
    next_id: AtomicI64,
    online: AtomicBool,
    requests: AtomicUsize,
}

impl MockGateway {
    /// Create a mock server pre-populated with books.
    ///
    /// Ids handed out by [`create()`](RemoteGateway::create) continue after
    /// the highest pre-populated id.
    pub fn with_books(books: impl IntoIterator<Item = Book>) -> Self {
        let books: BTreeMap<i64, Book> = books.into_iter().map(|book| (book.id, book)).collect();
        let next_id = books.keys().next_back().copied().unwrap_or(0).max(0) + 1;
        Self {
            name: "mock".to_string(),
            books: RwLock::new(books),
            next_id: AtomicI64::new(next_id),
            online: AtomicBool::new(true),
            requests: AtomicUsize::new(0),
        }
    }

    /// Change the name of the mock gateway.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Number of calls made against the gateway so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Snapshot of the server-side state, ordered by id.
    pub async fn books(&self) -> Vec<Book> {
        self.books.read().await.values().cloned().collect()
    }

    /// Change server-side state without going through (or counting as) a request.
    pub async fn put(&self, book: Book) {
        self.books.write().await.insert(book.id, book);
    }

    fn request(&self) -> Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if !self.is_online() {
            exn::bail!(ErrorKind::Unreachable);
        }
        Ok(())
    }
}
impl Default for MockGateway {
    fn default() -> Self {
        Self::with_books([])
    }
}

#[async_trait]
impl RemoteGateway for MockGateway {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_all(&self) -> Result<Vec<Book>> {
        self.request()?;
        Ok(self.books().await)
    }

    /// Same collection as `get_all()`, highest id first.
    async fn get_all_paged(&self) -> Result<Vec<Book>> {
        self.request()?;
        Ok(self.books.read().await.values().rev().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Book> {
        self.request()?;
        self.books.read().await.get(&id).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::Status(404)))
    }

    async fn create(&self, book: &Book) -> Result<Book> {
        self.request()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let created = book.clone().with_id(id);
        self.books.write().await.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, book: &Book) -> Result<Book> {
        self.request()?;
        let mut guard = self.books.write().await;
        let slot = guard.get_mut(&book.id).ok_or_else(|| exn::Exn::from(ErrorKind::Status(404)))?;
        *slot = book.clone();
        Ok(slot.clone())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.request()?;
        self.books.write().await.remove(&id).map(|_| ()).ok_or_else(|| exn::Exn::from(ErrorKind::Status(404)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: i64) -> Book {
        Book::new(id, format!("Book {id}"), "Author", "Genre", "reading")
    }

    #[tokio::test]
    async fn test_create_assigns_ids() {
        let gateway = MockGateway::with_books([book(4)]);
        let created = gateway.create(&book(-1)).await.unwrap();
        assert_eq!(created.id, 5);
        assert_eq!(gateway.get(5).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_listings() {
        let gateway = MockGateway::with_books([book(2), book(1), book(3)]);
        let ids: Vec<i64> = gateway.get_all().await.unwrap().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let ids: Vec<i64> = gateway.get_all_paged().await.unwrap().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn test_missing_is_404() {
        let gateway = MockGateway::default();
        assert!(matches!(&*gateway.get(1).await.unwrap_err(), ErrorKind::Status(404)));
        assert!(matches!(&*gateway.update(&book(1)).await.unwrap_err(), ErrorKind::Status(404)));
        assert!(matches!(&*gateway.delete(1).await.unwrap_err(), ErrorKind::Status(404)));
    }

    #[tokio::test]
    async fn test_offline_fails_everything() {
        let gateway = MockGateway::with_books([book(1)]);
        gateway.set_online(false);
        assert!(matches!(&*gateway.get_all().await.unwrap_err(), ErrorKind::Unreachable));
        assert!(matches!(&*gateway.delete(1).await.unwrap_err(), ErrorKind::Unreachable));
        assert!(matches!(&*gateway.create(&book(2)).await.unwrap_err(), ErrorKind::Unreachable));
        // Nothing changed server-side.
        assert_eq!(gateway.books().await, vec![book(1)]);
        assert_eq!(gateway.requests(), 3);
    }

    #[tokio::test]
    async fn test_put_is_not_a_request() {
        let gateway = MockGateway::default();
        gateway.put(book(8)).await;
        assert_eq!(gateway.requests(), 0);
        assert_eq!(gateway.get(8).await.unwrap(), book(8));
    }
}
