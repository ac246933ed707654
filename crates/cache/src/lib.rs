//! SQLite record store for the bookshelf.
//!
//! The cache mirrors the last known server state of every book the client
//! has seen, plus the books created while offline that the server doesn't
//! know about yet. It is never the source of truth; if the database is
//! deleted it is rebuilt by the next successful network read.
//!
//! # Architecture
//! - **books**: one row per [`Book`](bookshelf_model::Book), keyed by id.
//! - **outbox**: ids of books created offline, in creation order, waiting to
//!   be pushed. Rows disappear together with the book they reference.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::{Database, Location};
pub use crate::models::Pending;
pub use crate::repo::Repository;
