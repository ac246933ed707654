//! Network-first, cache-fallback access to the bookshelf.
//!
//! [`Shelf`] composes the remote gateway and the local cache. Every read
//! goes to the network first and mirrors what it got into the cache; when
//! the network fails, the cache answers instead. Results are wrapped in
//! [`Sourced`] so callers know which of the two they're looking at.
//!
//! Writes go to the network and are mirrored on success. A create issued
//! while offline is stored locally and queued, then pushed by
//! [`Shelf::sync_pending`] once the server is reachable again.

mod change;
pub mod error;
mod mirror;
mod notify;
mod outbox;
mod shelf;
mod source;

pub use crate::change::Change;
pub use crate::outbox::{Pushed, SyncReport};
pub use crate::shelf::{Connectivity, Shelf};
pub use crate::source::{Source, Sourced};
pub use bookshelf_cache::Pending;
