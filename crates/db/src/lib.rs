//! In-process record storage for bookshelf.
//!
//! [`Table`] stands in for a database table: sequence-generated ids,
//! insert-or-update saves, and predicate lookups. [`PageRequest`] turns a
//! filtered row set into a sorted [`Page`].

pub mod page;
pub mod table;

pub use page::{Direction, Page, PageError, PageRequest, SortOrder, Sortable};
pub use table::{Record, Table};

/// Log which storage backend is in use.
pub fn init() {
    tracing::info!(target: "bookshelf-db", backend = "in-memory", "record store ready");
}
