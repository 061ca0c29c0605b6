use std::sync::Arc;

use async_trait::async_trait;
use bookshelf_db::{Page, PageRequest, Record, Table};
use chrono::NaiveDate;

use super::models::{User, UserFilter, UserKind, UserProfile};
use crate::modules::books::models::Book;
use crate::modules::error::LibraryError;

/// Persistence operations the users service needs.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_all(
        &self,
        filter: &UserFilter,
        page: &PageRequest,
    ) -> Result<Page<User>, LibraryError>;
    /// Insert-or-update, including the book collection.
    async fn save(&self, user: User) -> anyhow::Result<User>;
    async fn delete_by_id(&self, id: i64) -> anyhow::Result<bool>;
    async fn exists_by_id(&self, id: i64) -> anyhow::Result<bool>;
}

/// Stored form of a user: owned books are kept as ids.
#[derive(Debug, Clone)]
pub struct UserRow {
    id: Option<i64>,
    username: String,
    name: String,
    birthdate: NaiveDate,
    password_hash: String,
    kind: UserKind,
    book_ids: Vec<i64>,
}

impl Record for UserRow {
    fn id(&self) -> Option<i64> {
        self.id
    }

    fn assign_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        let profile = user.profile();
        Self {
            id: user.id(),
            username: profile.username,
            name: profile.name,
            birthdate: profile.birthdate,
            password_hash: user.password_hash().to_string(),
            kind: profile.kind,
            book_ids: user.books().iter().filter_map(Book::id).collect(),
        }
    }
}

/// [`UserRepository`] over in-process tables.
///
/// Owned books are resolved against the books table on every load; ids whose
/// book has been deleted are skipped.
pub struct InMemoryUserRepository {
    users: Arc<Table<UserRow>>,
    books: Arc<Table<Book>>,
}

impl InMemoryUserRepository {
    pub fn new(users: Arc<Table<UserRow>>, books: Arc<Table<Book>>) -> Self {
        Self { users, books }
    }

    fn load(&self, row: UserRow) -> User {
        let books = row
            .book_ids
            .iter()
            .filter_map(|id| self.books.get(*id))
            .collect();
        let profile = UserProfile {
            username: row.username,
            name: row.name,
            birthdate: row.birthdate,
            kind: row.kind,
        };
        // Rows only leave the table with an id assigned.
        User::restore(row.id.unwrap_or_default(), profile, row.password_hash, books)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<User>> {
        Ok(self.users.get(id).map(|row| self.load(row)))
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .find(|row| row.username == username)
            .map(|row| self.load(row)))
    }

    async fn find_all(
        &self,
        filter: &UserFilter,
        page: &PageRequest,
    ) -> Result<Page<User>, LibraryError> {
        page.ensure_sortable::<User>()?;
        let users = self
            .users
            .all()
            .into_iter()
            .map(|row| self.load(row))
            .filter(|user| filter.matches(user))
            .collect();
        Ok(page.apply(users)?)
    }

    async fn save(&self, user: User) -> anyhow::Result<User> {
        let row = self.users.save(UserRow::from(&user));
        Ok(self.load(row))
    }

    async fn delete_by_id(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.users.delete(id).is_some())
    }

    async fn exists_by_id(&self, id: i64) -> anyhow::Result<bool> {
        Ok(self.users.exists(id))
    }
}
