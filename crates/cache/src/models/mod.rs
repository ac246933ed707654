mod book;
mod pending;

pub(crate) use self::book::BookRow;
pub use self::pending::Pending;
pub(crate) use self::pending::PendingRow;
