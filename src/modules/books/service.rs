use std::sync::Arc;

use bookshelf_db::{Page, PageRequest};
use tracing::{debug, info, instrument};

use super::catalog::{map_book_info, CatalogClient};
use super::models::{Book, BookFilter, BookPayload};
use super::repository::BookRepository;
use crate::modules::error::LibraryError;
use crate::modules::guard::{check_absent_id, check_matching_ids, require_found};

/// Where an ISBN lookup found its book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IsbnResolution {
    /// Already stored locally; the catalog was not consulted.
    Local(Book),
    /// Fetched from the catalog and stored.
    Fetched(Book),
}

impl IsbnResolution {
    pub fn into_book(self) -> Book {
        match self {
            IsbnResolution::Local(book) | IsbnResolution::Fetched(book) => book,
        }
    }
}

/// Book use cases over the repository and catalog ports.
#[derive(Clone)]
pub struct BookService {
    repo: Arc<dyn BookRepository>,
    catalog: Arc<dyn CatalogClient>,
}

impl BookService {
    pub fn new(repo: Arc<dyn BookRepository>, catalog: Arc<dyn CatalogClient>) -> Self {
        Self { repo, catalog }
    }

    #[instrument(name = "books.service.list", skip(self, filter))]
    pub async fn list(
        &self,
        filter: &BookFilter,
        page: &PageRequest,
    ) -> Result<Page<Book>, LibraryError> {
        self.repo.find_all(filter, page).await
    }

    #[instrument(name = "books.service.get", skip(self), fields(book_id = id))]
    pub async fn get(&self, id: i64) -> Result<Book, LibraryError> {
        let found = self.repo.find_by_id(id).await?;
        require_found(found, || LibraryError::book_not_found(id))
    }

    #[instrument(name = "books.service.find_by_author", skip(self))]
    pub async fn find_by_author(&self, author: &str) -> Result<Book, LibraryError> {
        let found = self.repo.find_by_author(author).await?;
        require_found(found, || {
            LibraryError::not_found(format!("book by author '{}'", author))
        })
    }

    /// Return the local book for `isbn`, or fetch, map, and store it from the
    /// catalog.
    #[instrument(name = "books.service.resolve_isbn", skip(self))]
    pub async fn resolve_isbn(&self, isbn: &str) -> Result<IsbnResolution, LibraryError> {
        if let Some(book) = self.repo.find_by_isbn(isbn).await? {
            debug!(book_id = ?book.id(), "isbn found locally");
            return Ok(IsbnResolution::Local(book));
        }

        let info = self
            .catalog
            .lookup(isbn)
            .await?
            .ok_or_else(|| LibraryError::CatalogLookupNotFound {
                isbn: isbn.to_string(),
            })?;

        let book = map_book_info(info, isbn).into_book()?;
        let saved = self.repo.save(book).await?;
        info!(book_id = ?saved.id(), "book imported from catalog");
        Ok(IsbnResolution::Fetched(saved))
    }

    #[instrument(name = "books.service.create", skip(self, payload))]
    pub async fn create(&self, payload: BookPayload) -> Result<Book, LibraryError> {
        let book = payload.into_book()?;

        let exists = match book.id() {
            Some(id) => self.repo.exists_by_id(id).await?,
            None => false,
        };
        check_absent_id("book", book.id(), |_| exists)?;

        let saved = self.repo.save(book).await?;
        info!(book_id = ?saved.id(), "book created");
        Ok(saved)
    }

    #[instrument(name = "books.service.update", skip(self, payload), fields(book_id = id))]
    pub async fn update(&self, id: i64, payload: BookPayload) -> Result<Book, LibraryError> {
        check_matching_ids(id, payload.id)?;
        if !self.repo.exists_by_id(id).await? {
            return Err(LibraryError::book_not_found(id));
        }

        let saved = self.repo.save(payload.into_book()?).await?;
        info!("book updated");
        Ok(saved)
    }

    #[instrument(name = "books.service.delete", skip(self), fields(book_id = id))]
    pub async fn delete(&self, id: i64) -> Result<(), LibraryError> {
        if !self.repo.delete_by_id(id).await? {
            return Err(LibraryError::book_not_found(id));
        }
        info!("book deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::catalog::{BookInfo, Named};
    use crate::modules::books::repository::InMemoryBookRepository;
    use async_trait::async_trait;
    use bookshelf_db::Table;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeCatalog {
        record: Option<BookInfo>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogClient for FakeCatalog {
        async fn lookup(&self, _isbn: &str) -> anyhow::Result<Option<BookInfo>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.record.clone())
        }
    }

    fn payload(isbn: &str) -> BookPayload {
        BookPayload {
            id: None,
            genre: Some("Fantasy".into()),
            author: Some("Ursula K. Le Guin".into()),
            image: Some("cover.jpg".into()),
            title: Some("A Wizard of Earthsea".into()),
            subtitle: Some("Earthsea Cycle".into()),
            publisher: Some("Parnassus".into()),
            year: Some("1968".into()),
            pages: Some("205".into()),
            isbn: Some(isbn.into()),
        }
    }

    fn hobbit() -> BookInfo {
        BookInfo {
            authors: vec![Named {
                name: "J.R.R. Tolkien".into(),
            }],
            publishers: vec![Named {
                name: "Allen & Unwin".into(),
            }],
            title: Some("The Hobbit".into()),
            subtitle: Some("There and Back Again".into()),
            publish_date: Some("1937".into()),
            number_of_pages: Some("310".into()),
            cover: Some(crate::modules::books::catalog::Cover {
                medium: Some("hobbit-M.jpg".into()),
                ..Default::default()
            }),
        }
    }

    fn service(catalog: Arc<FakeCatalog>) -> BookService {
        let repo = Arc::new(InMemoryBookRepository::new(Arc::new(Table::new("books"))));
        BookService::new(repo, catalog)
    }

    #[tokio::test]
    async fn local_isbn_skips_the_catalog() {
        let catalog = Arc::new(FakeCatalog {
            record: Some(hobbit()),
            ..Default::default()
        });
        let service = service(catalog.clone());
        let stored = service.create(payload("111")).await.unwrap();

        let resolved = service.resolve_isbn("111").await.unwrap();
        assert_eq!(resolved, IsbnResolution::Local(stored));
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_isbn_is_fetched_and_stored() {
        let catalog = Arc::new(FakeCatalog {
            record: Some(hobbit()),
            ..Default::default()
        });
        let service = service(catalog.clone());

        let IsbnResolution::Fetched(book) = service.resolve_isbn("0261102214").await.unwrap()
        else {
            panic!("expected a fetched book");
        };
        assert_eq!(book.title, "The Hobbit");
        assert_eq!(book.publisher, "J.R.R. Tolkien");
        assert_eq!(book.isbn, "0261102214");
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);

        let again = service.resolve_isbn("0261102214").await.unwrap();
        assert!(matches!(again, IsbnResolution::Local(_)));
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn catalog_miss_is_reported() {
        let service = service(Arc::new(FakeCatalog::default()));
        let err = service.resolve_isbn("000").await.unwrap_err();
        assert!(matches!(err, LibraryError::CatalogLookupNotFound { isbn } if isbn == "000"));
    }

    #[tokio::test]
    async fn create_rejects_a_stored_id_and_discards_an_unknown_one() {
        let service = service(Arc::new(FakeCatalog::default()));
        let first = service.create(payload("1")).await.unwrap();

        let reused = BookPayload {
            id: first.id(),
            ..payload("2")
        };
        assert!(matches!(
            service.create(reused).await,
            Err(LibraryError::IdentifierMustBeAbsent("book"))
        ));

        let unknown = BookPayload {
            id: Some(99),
            ..payload("3")
        };
        let created = service.create(unknown).await.unwrap();
        assert_eq!(created.id(), Some(2));
    }

    #[tokio::test]
    async fn update_checks_ids_before_existence() {
        let service = service(Arc::new(FakeCatalog::default()));

        let mismatched = BookPayload {
            id: Some(2),
            ..payload("1")
        };
        assert!(matches!(
            service.update(1, mismatched).await,
            Err(LibraryError::IdentifierMismatch { path: 1, body: Some(2) })
        ));

        let missing = BookPayload {
            id: Some(5),
            ..payload("1")
        };
        assert!(matches!(
            service.update(5, missing).await,
            Err(LibraryError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn update_replaces_and_delete_removes() {
        let service = service(Arc::new(FakeCatalog::default()));
        let book = service.create(payload("1")).await.unwrap();
        let id = book.id().unwrap();

        let renamed = BookPayload {
            id: Some(id),
            title: Some("The Tombs of Atuan".into()),
            ..payload("1")
        };
        let updated = service.update(id, renamed).await.unwrap();
        assert_eq!(updated.id(), Some(id));
        assert_eq!(service.get(id).await.unwrap().title, "The Tombs of Atuan");

        service.delete(id).await.unwrap();
        assert!(matches!(
            service.delete(id).await,
            Err(LibraryError::NotFound { .. })
        ));
    }
}
