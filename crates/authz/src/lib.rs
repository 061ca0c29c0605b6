//! Authentication hooks and guards.
//!
//! Requests carry HTTP Basic credentials which are checked against stored
//! bcrypt hashes. The outcome is an explicit [`Principal`]; nothing is kept in
//! ambient state.

use thiserror::Error;

pub mod credentials;
pub mod guard;
pub mod password;

pub use credentials::BasicCredentials;
pub use guard::{AccessPolicy, Authenticator, CredentialStore, Principal, PublicRoute};
pub use password::{BcryptHasher, PasswordHasher};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication required")]
    MissingCredentials,

    #[error("malformed Basic credentials")]
    MalformedCredentials,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
