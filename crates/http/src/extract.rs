//! Request extractors whose rejections use the [`AppError`] envelope.
//!
//! Wrappers over axum's `Json`, `Query` and `Path`. A body, query string or
//! path segment that fails to deserialize becomes a 422 `validation_error`
//! whose details name the offending field when axum reports one.

use std::future::Future;

use axum::{
    extract::{
        path::ErrorKind,
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::request::Parts,
    Json,
};
use serde_json::json;

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

/// Query string parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidQuery<T>(pub T);

/// Path parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidPath<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    #[allow(clippy::manual_async_fn)]
    fn from_request(
        req: Request,
        state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            match Json::<T>::from_request(req, state).await {
                Ok(Json(value)) => Ok(Self(value)),
                Err(rejection) => Err(json_rejection(rejection)),
            }
        }
    }
}

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    #[allow(clippy::manual_async_fn)]
    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            match Query::<T>::from_request_parts(parts, state).await {
                Ok(Query(value)) => Ok(Self(value)),
                Err(rejection) => Err(query_rejection(rejection)),
            }
        }
    }
}

impl<T, S> FromRequestParts<S> for ValidPath<T>
where
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    #[allow(clippy::manual_async_fn)]
    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            match Path::<T>::from_request_parts(parts, state).await {
                Ok(Path(value)) => Ok(Self(value)),
                Err(rejection) => Err(path_rejection(rejection)),
            }
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    let text = rejection.body_text();
    let field = offending_field(&text).unwrap_or_else(|| "body".to_string());
    malformed("invalid request body", field, text)
}

fn query_rejection(rejection: QueryRejection) -> AppError {
    let text = rejection.body_text();
    let field = offending_field(&text).unwrap_or_else(|| "query".to_string());
    malformed("invalid query string", field, text)
}

fn path_rejection(rejection: PathRejection) -> AppError {
    let field = match &rejection {
        PathRejection::FailedToDeserializePathParams(err) => match err.kind() {
            ErrorKind::ParseErrorAtKey { key, .. } => Some(key.clone()),
            ErrorKind::DeserializeError { key, .. } => Some(key.clone()),
            _ => None,
        },
        _ => None,
    };
    malformed(
        "invalid path parameter",
        field.unwrap_or_else(|| "path".to_string()),
        rejection.body_text(),
    )
}

fn malformed(message: &str, field: String, error: String) -> AppError {
    AppError::validation(vec![json!({ "field": field, "error": error })], message)
}

/// Field named in an axum deserialization message.
///
/// Messages read `<prefix>: <path>: <error>`, or mention ``missing field `name` ``.
fn offending_field(message: &str) -> Option<String> {
    if let Some(rest) = message.split("missing field `").nth(1) {
        return rest.split('`').next().map(str::to_string);
    }

    let (_, detail) = message.split_once(": ")?;
    let (path, _) = detail.split_once(": ")?;
    let path = path.trim();
    if path.is_empty() || path.contains(char::is_whitespace) {
        None
    } else {
        Some(path.to_string())
    }
}
