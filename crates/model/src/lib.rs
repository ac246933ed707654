//! Domain types for the bookshelf.
//!
//! The [`Book`] shape defined here is the contract shared by everything that
//! touches a record: the local cache, the remote API (JSON bodies) and the
//! push channel that announces changed records.

mod book;
pub mod view;

pub use crate::book::{Book, READING};
