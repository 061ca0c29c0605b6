//! Basic-auth middleware
//!
//! Authenticates every request that the [`AccessPolicy`] does not mark public
//! and inserts the resulting [`Principal`] into the request extensions, where
//! handlers pick it up with `Extension<Principal>`.

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use bookshelf_authz::{AccessPolicy, Authenticator};

use crate::error::AppError;

/// Shared state for [`require_principal`].
#[derive(Clone)]
pub struct AuthGuard {
    authenticator: Arc<Authenticator>,
    policy: Arc<AccessPolicy>,
}

impl AuthGuard {
    pub fn new(authenticator: Authenticator, policy: AccessPolicy) -> Self {
        Self {
            authenticator: Arc::new(authenticator),
            policy: Arc::new(policy),
        }
    }
}

pub async fn require_principal(
    State(guard): State<AuthGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| original.path().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    if guard.policy.is_public(request.method().as_str(), &path) {
        return Ok(next.run(request).await);
    }

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let principal = guard.authenticator.authenticate(header).await?;
    tracing::debug!(principal = %principal.username(), "request authenticated");

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
