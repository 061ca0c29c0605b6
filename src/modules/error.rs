//! Failures shared by the books and users modules and their HTTP mapping.

use bookshelf_db::PageError;
use bookshelf_http::AppError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("path id {path} does not match body id {}", display_id(.body))]
    IdentifierMismatch { path: i64, body: Option<i64> },

    #[error("{0} must not carry an id when created")]
    IdentifierMustBeAbsent(&'static str),

    #[error("book {book_id} is already in the collection")]
    DuplicateOwnership { book_id: i64 },

    #[error("password and verified_password do not match")]
    PasswordMismatch,

    #[error("no catalog record for ISBN {isbn}")]
    CatalogLookupNotFound { isbn: String },

    #[error("{message}")]
    InvalidRequest {
        message: String,
        details: Vec<serde_json::Value>,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

fn display_id(id: &Option<i64>) -> String {
    id.map_or_else(|| "<none>".to_string(), |id| id.to_string())
}

impl LibraryError {
    pub fn book_not_found(id: i64) -> Self {
        Self::NotFound {
            resource: format!("book {}", id),
        }
    }

    pub fn user_not_found(id: i64) -> Self {
        Self::NotFound {
            resource: format!("user {}", id),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Fields that were required but absent.
    pub fn missing_fields(fields: &[&str]) -> Self {
        Self::InvalidRequest {
            message: format!("missing required fields: {}", fields.join(", ")),
            details: fields
                .iter()
                .map(|field| json!({ "field": field, "error": "required" }))
                .collect(),
        }
    }
}

impl From<PageError> for LibraryError {
    fn from(err: PageError) -> Self {
        let field = match &err {
            PageError::InvalidSize { .. } => "size",
            PageError::UnknownSortField { .. } | PageError::UnknownDirection(_) => "sort",
        };
        Self::InvalidRequest {
            details: vec![json!({ "field": field, "error": err.to_string() })],
            message: err.to_string(),
        }
    }
}

impl From<LibraryError> for AppError {
    fn from(err: LibraryError) -> Self {
        let message = err.to_string();
        match err {
            LibraryError::NotFound { .. } => AppError::not_found(message),
            LibraryError::IdentifierMismatch { .. } => {
                AppError::bad_request(message).with_code("identifier_mismatch")
            }
            LibraryError::IdentifierMustBeAbsent(_) => {
                AppError::bad_request(message).with_code("identifier_must_be_absent")
            }
            LibraryError::DuplicateOwnership { .. } => {
                AppError::bad_request(message).with_code("duplicate_ownership")
            }
            LibraryError::PasswordMismatch => {
                AppError::bad_request(message).with_code("password_mismatch")
            }
            LibraryError::CatalogLookupNotFound { .. } => {
                AppError::not_found(message).with_code("catalog_lookup_not_found")
            }
            LibraryError::InvalidRequest { details, message } => {
                AppError::validation(details, message)
            }
            LibraryError::Internal(e) => AppError::Internal(e),
        }
    }
}
