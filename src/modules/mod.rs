pub mod books;
pub mod error;
pub mod guard;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use bookshelf_authz::{
    AccessPolicy, Authenticator, BcryptHasher, CredentialStore, PasswordHasher,
};
use bookshelf_db::Table;
use bookshelf_http::AuthGuard;
use bookshelf_kernel::{settings::Settings, ModuleRegistry};

use books::catalog::{CatalogClient, OpenLibraryClient};
use books::repository::{BookRepository, InMemoryBookRepository};
use books::service::BookService;
use users::repository::{InMemoryUserRepository, UserRepository};
use users::service::UserService;

/// The collaborators the modules are built from.
#[derive(Clone)]
pub struct Services {
    pub books: Arc<dyn BookRepository>,
    pub users: Arc<dyn UserRepository>,
    pub catalog: Arc<dyn CatalogClient>,
    pub hasher: Arc<dyn PasswordHasher>,
}

impl Services {
    /// In-process tables, the Open Library client, and bcrypt at the
    /// configured cost.
    pub fn in_memory(settings: &Settings) -> Self {
        let book_table = Arc::new(Table::new("books"));
        let user_table = Arc::new(Table::new("users"));

        Self {
            books: Arc::new(InMemoryBookRepository::new(book_table.clone())),
            users: Arc::new(InMemoryUserRepository::new(user_table, book_table)),
            catalog: Arc::new(OpenLibraryClient::new(settings.catalog.clone())),
            hasher: Arc::new(BcryptHasher::new(settings.auth.bcrypt_cost)),
        }
    }

    /// Swap the catalog client, e.g. for a stub in tests.
    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogClient>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn book_service(&self) -> BookService {
        BookService::new(self.books.clone(), self.catalog.clone())
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(self.users.clone(), self.books.clone(), self.hasher.clone())
    }

    /// Basic-auth guard over the user store. Registration and book creation
    /// stay public.
    pub fn auth_guard(&self) -> AuthGuard {
        let store = Arc::new(UserCredentials {
            users: self.users.clone(),
        });
        let policy = AccessPolicy::new()
            .permit("POST", "/api/books")
            .permit("POST", "/api/users");
        AuthGuard::new(Authenticator::new(store, self.hasher.clone()), policy)
    }
}

/// Looks up password hashes in the user repository.
struct UserCredentials {
    users: Arc<dyn UserRepository>,
}

#[async_trait]
impl CredentialStore for UserCredentials {
    async fn password_hash(&self, username: &str) -> anyhow::Result<Option<String>> {
        Ok(self
            .users
            .find_by_username(username)
            .await?
            .map(|user| user.password_hash().to_string()))
    }
}

/// Register all project-specific modules with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    services: &Services,
    settings: &Settings,
) -> anyhow::Result<()> {
    registry.register(books::create_module(
        services.book_service(),
        settings.pagination.clone(),
    ))?;
    registry.register(users::create_module(
        services.user_service(),
        settings.pagination.clone(),
    ))?;
    Ok(())
}
