use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;

use crate::{AuthError, BasicCredentials, PasswordHasher};

/// The authenticated caller, handed explicitly to request handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    username: String,
}

impl Principal {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Lookup of stored password hashes by username.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn password_hash(&self, username: &str) -> anyhow::Result<Option<String>>;
}

/// Verifies Basic credentials against a [`CredentialStore`].
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl Authenticator {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    /// Authenticate the raw `Authorization` header value, if any.
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<Principal, AuthError> {
        let header = authorization.ok_or(AuthError::MissingCredentials)?;
        let credentials = BasicCredentials::parse(header)?;

        let Some(stored) = self.store.password_hash(&credentials.username).await? else {
            tracing::debug!(username = %credentials.username, "unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        let BasicCredentials { username, password } = credentials;
        if !self.verify_password(password, stored).await? {
            tracing::debug!(username = %username, "password rejected");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(Principal::new(username))
    }

    /// Verification runs on the blocking pool.
    async fn verify_password(&self, plaintext: String, stored: String) -> anyhow::Result<bool> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &stored))
            .await
            .context("password verification task failed")?
    }
}

/// A method and path that may be called without credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicRoute {
    pub method: String,
    pub path: String,
}

/// Decides which requests skip authentication.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    public: Vec<PublicRoute>,
}

impl AccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permit(mut self, method: &str, path: &str) -> Self {
        self.public.push(PublicRoute {
            method: method.to_ascii_uppercase(),
            path: normalize(path).to_string(),
        });
        self
    }

    pub fn is_public(&self, method: &str, path: &str) -> bool {
        let path = normalize(path);
        self.public
            .iter()
            .any(|route| route.method.eq_ignore_ascii_case(method) && route.path == path)
    }
}

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
