use std::sync::Arc;

use async_trait::async_trait;
use bookshelf_db::{Page, PageRequest, Table};

use super::models::{Book, BookFilter};
use crate::modules::error::LibraryError;

/// Persistence operations the books service needs.
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Book>>;
    /// First book (lowest id) written by `author`.
    async fn find_by_author(&self, author: &str) -> anyhow::Result<Option<Book>>;
    async fn find_by_isbn(&self, isbn: &str) -> anyhow::Result<Option<Book>>;
    async fn find_all(
        &self,
        filter: &BookFilter,
        page: &PageRequest,
    ) -> Result<Page<Book>, LibraryError>;
    /// Insert-or-update; returns the stored row with its id.
    async fn save(&self, book: Book) -> anyhow::Result<Book>;
    async fn delete_by_id(&self, id: i64) -> anyhow::Result<bool>;
    async fn exists_by_id(&self, id: i64) -> anyhow::Result<bool>;
}

/// [`BookRepository`] over an in-process [`Table`].
pub struct InMemoryBookRepository {
    table: Arc<Table<Book>>,
}

impl InMemoryBookRepository {
    pub fn new(table: Arc<Table<Book>>) -> Self {
        Self { table }
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Book>> {
        Ok(self.table.get(id))
    }

    async fn find_by_author(&self, author: &str) -> anyhow::Result<Option<Book>> {
        Ok(self.table.find(|book| book.author == author))
    }

    async fn find_by_isbn(&self, isbn: &str) -> anyhow::Result<Option<Book>> {
        Ok(self.table.find(|book| book.isbn == isbn))
    }

    async fn find_all(
        &self,
        filter: &BookFilter,
        page: &PageRequest,
    ) -> Result<Page<Book>, LibraryError> {
        page.ensure_sortable::<Book>()?;
        let rows = self.table.filter(|book| filter.matches(book));
        Ok(page.apply(rows)?)
    }

    async fn save(&self, book: Book) -> anyhow::Result<Book> {
        Ok(self.table.save(book))
    }

    async fn delete_by_id(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.table.delete(id).is_some())
    }

    async fn exists_by_id(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.table.exists(id))
    }
}
