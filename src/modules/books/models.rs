use std::cmp::Ordering;

use bookshelf_db::{Record, Sortable};
use serde::{Deserialize, Serialize};

use crate::modules::error::LibraryError;

/// A stored book. Every field except `genre` is required.
///
/// `year` and `pages` are kept as the strings the client or catalog supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    id: Option<i64>,
    pub genre: Option<String>,
    pub author: String,
    pub image: String,
    pub title: String,
    pub subtitle: String,
    pub publisher: String,
    pub year: String,
    pub pages: String,
    pub isbn: String,
}

impl Book {
    pub fn id(&self) -> Option<i64> {
        self.id
    }
}

impl Record for Book {
    fn id(&self) -> Option<i64> {
        self.id
    }

    fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

impl Sortable for Book {
    const SORT_FIELDS: &'static [&'static str] = &[
        "id",
        "genre",
        "author",
        "title",
        "subtitle",
        "publisher",
        "year",
        "pages",
        "isbn",
    ];

    fn compare_by(&self, other: &Self, field: &str) -> Ordering {
        match field {
            "genre" => self.genre.cmp(&other.genre),
            "author" => self.author.cmp(&other.author),
            "title" => self.title.cmp(&other.title),
            "subtitle" => self.subtitle.cmp(&other.subtitle),
            "publisher" => self.publisher.cmp(&other.publisher),
            "year" => self.year.cmp(&other.year),
            "pages" => self.pages.cmp(&other.pages),
            "isbn" => self.isbn.cmp(&other.isbn),
            _ => self.id.cmp(&other.id),
        }
    }
}

/// Request body for creating or replacing a book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookPayload {
    pub id: Option<i64>,
    pub genre: Option<String>,
    pub author: Option<String>,
    pub image: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<String>,
    pub pages: Option<String>,
    pub isbn: Option<String>,
}

impl BookPayload {
    /// Validate required fields, reporting every missing one at once.
    pub fn into_book(self) -> Result<Book, LibraryError> {
        let mut missing = Vec::new();
        let mut take = |value: Option<String>, field: &'static str| {
            if value.is_none() {
                missing.push(field);
            }
            value.unwrap_or_default()
        };

        let book = Book {
            id: self.id,
            genre: self.genre,
            author: take(self.author, "author"),
            image: take(self.image, "image"),
            title: take(self.title, "title"),
            subtitle: take(self.subtitle, "subtitle"),
            publisher: take(self.publisher, "publisher"),
            year: take(self.year, "year"),
            pages: take(self.pages, "pages"),
            isbn: take(self.isbn, "isbn"),
        };

        if missing.is_empty() {
            Ok(book)
        } else {
            Err(LibraryError::missing_fields(&missing))
        }
    }
}

/// Exact-match filters for the book listing. Unset fields match anything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookFilter {
    pub id: Option<i64>,
    pub genre: Option<String>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<String>,
    pub pages: Option<String>,
    pub isbn: Option<String>,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        fn eq(wanted: &Option<String>, actual: &str) -> bool {
            wanted.as_deref().map_or(true, |wanted| wanted == actual)
        }

        self.id.map_or(true, |id| book.id == Some(id))
            && self
                .genre
                .as_deref()
                .map_or(true, |genre| book.genre.as_deref() == Some(genre))
            && eq(&self.author, &book.author)
            && eq(&self.title, &book.title)
            && eq(&self.subtitle, &book.subtitle)
            && eq(&self.publisher, &book.publisher)
            && eq(&self.year, &book.year)
            && eq(&self.pages, &book.pages)
            && eq(&self.isbn, &book.isbn)
    }
}
