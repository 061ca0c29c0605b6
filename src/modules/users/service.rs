use std::sync::Arc;

use anyhow::Context;
use bookshelf_authz::PasswordHasher;
use bookshelf_db::{Page, PageRequest};
use tracing::{info, instrument};

use super::models::{User, UserFilter, UserPayload};
use super::password::PasswordChange;
use super::repository::UserRepository;
use crate::modules::books::repository::BookRepository;
use crate::modules::error::LibraryError;
use crate::modules::guard::{check_absent_id, check_matching_ids, require_found};

/// User use cases: profile CRUD, book ownership, and password changes.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    books: Arc<dyn BookRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        books: Arc<dyn BookRepository>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            users,
            books,
            hasher,
        }
    }

    /// Hashing runs on the blocking pool.
    async fn hash_password(&self, plaintext: String) -> Result<String, LibraryError> {
        let hasher = self.hasher.clone();
        let hashed = tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .context("password hashing task failed")??;
        Ok(hashed)
    }

    async fn load(&self, id: i64) -> Result<User, LibraryError> {
        let found = self.users.find_by_id(id).await?;
        require_found(found, || LibraryError::user_not_found(id))
    }

    #[instrument(name = "users.service.list", skip(self, filter))]
    pub async fn list(
        &self,
        filter: &UserFilter,
        page: &PageRequest,
    ) -> Result<Page<User>, LibraryError> {
        self.users.find_all(filter, page).await
    }

    #[instrument(name = "users.service.get", skip(self), fields(user_id = id))]
    pub async fn get(&self, id: i64) -> Result<User, LibraryError> {
        self.load(id).await
    }

    #[instrument(name = "users.service.find_by_username", skip(self))]
    pub async fn find_by_username(&self, username: &str) -> Result<User, LibraryError> {
        let found = self.users.find_by_username(username).await?;
        require_found(found, || {
            LibraryError::not_found(format!("user '{}'", username))
        })
    }

    #[instrument(name = "users.service.create", skip(self, payload))]
    pub async fn create(&self, payload: UserPayload) -> Result<User, LibraryError> {
        check_absent_id("user", payload.id, |_| true)?;
        let profile = payload.profile(true)?;
        let password = payload.password.unwrap_or_default();

        let user = User::new(profile, self.hash_password(password).await?);
        let saved = self.users.save(user).await?;
        info!(user_id = ?saved.id(), username = %saved.username, "user created");
        Ok(saved)
    }

    /// Replace profile and kind. The password is re-hashed only when the
    /// payload carries one; the book collection is never touched.
    #[instrument(name = "users.service.update", skip(self, payload), fields(user_id = id))]
    pub async fn update(&self, id: i64, payload: UserPayload) -> Result<User, LibraryError> {
        check_matching_ids(id, payload.id)?;
        let mut user = self.load(id).await?;

        let profile = payload.profile(false)?;
        user.apply_profile(profile);
        if let Some(password) = payload.password {
            user.set_password_hash(self.hash_password(password).await?);
        }

        let saved = self.users.save(user).await?;
        info!("user updated");
        Ok(saved)
    }

    #[instrument(name = "users.service.delete", skip(self), fields(user_id = id))]
    pub async fn delete(&self, id: i64) -> Result<(), LibraryError> {
        if !self.users.delete_by_id(id).await? {
            return Err(LibraryError::user_not_found(id));
        }
        info!("user deleted");
        Ok(())
    }

    #[instrument(name = "users.service.add_book", skip(self), fields(user_id = id))]
    pub async fn add_book(&self, id: i64, book_id: i64) -> Result<User, LibraryError> {
        let mut user = self.load(id).await?;
        let book = require_found(self.books.find_by_id(book_id).await?, || {
            LibraryError::book_not_found(book_id)
        })?;

        user.add_book(book)?;
        let saved = self.users.save(user).await?;
        info!(book_id, "book added to collection");
        Ok(saved)
    }

    #[instrument(name = "users.service.remove_book", skip(self), fields(user_id = id))]
    pub async fn remove_book(&self, id: i64, book_id: i64) -> Result<User, LibraryError> {
        let mut user = self.load(id).await?;
        user.remove_book(book_id);
        let saved = self.users.save(user).await?;
        info!(book_id, "book removed from collection");
        Ok(saved)
    }

    #[instrument(name = "users.service.change_password", skip(self, change), fields(user_id = id))]
    pub async fn change_password(
        &self,
        id: i64,
        change: PasswordChange,
    ) -> Result<User, LibraryError> {
        let password = change.validate()?.to_string();
        let mut user = self.load(id).await?;

        user.set_password_hash(self.hash_password(password).await?);
        let saved = self.users.save(user).await?;
        info!("password changed");
        Ok(saved)
    }
}
