//! Remote gateway trait and implementations.
//!
//! This module defines the `RemoteGateway` trait, a stateless mapping of book
//! operations onto the server's API. Every implementation reports a failure
//! the same way, whether the server was unreachable or answered with an
//! error status, so callers can treat "the network failed" as one case.

mod http;
#[cfg(feature = "mock")]
mod mock;

pub use self::http::HttpGateway;
#[cfg(feature = "mock")]
pub use self::mock::MockGateway;
use crate::error::Result;
use async_trait::async_trait;
use bookshelf_model::Book;

/// Unified interface to the bookshelf server.
///
/// It's a glorified CRUD interface plus one extra listing endpoint. The
/// server's response is authoritative: [`create()`](Self::create) and
/// [`update()`](Self::update) return what the server stored, which may differ
/// from what was sent (most notably the id assigned on creation).
///
/// # Examples
///
/// ```
/// use bookshelf_remote::{RemoteGateway, error::Result};
///
/// async fn titles(gateway: &dyn RemoteGateway) -> Result<Vec<String>> {
///     let books = gateway.get_all().await?;
///     Ok(books.into_iter().map(|book| book.title).collect())
/// }
/// ```
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Name of the gateway, used for logging only.
    fn name(&self) -> &str;

    /// `GET /books`
    async fn get_all(&self) -> Result<Vec<Book>>;

    /// `GET /allBooks`
    ///
    /// Alternate listing that returns the full collection across every page
    /// of the server's storage, possibly in a different order than
    /// [`get_all()`](Self::get_all). Used by aggregate views.
    async fn get_all_paged(&self) -> Result<Vec<Book>>;

    /// `GET /book/{id}`
    async fn get(&self, id: i64) -> Result<Book>;

    /// `POST /book`
    ///
    /// The id of the submitted book is ignored by the server.
    async fn create(&self, book: &Book) -> Result<Book>;

    /// `PUT /book/{id}`
    async fn update(&self, book: &Book) -> Result<Book>;

    /// `DELETE /book/{id}`
    async fn delete(&self, id: i64) -> Result<()>;
}
