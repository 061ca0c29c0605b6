//! Identity checks applied before create, update, and delete.

use super::error::LibraryError;

/// The id in the path and the id in the body must agree. A body without an
/// id never matches.
pub fn check_matching_ids(path: i64, body: Option<i64>) -> Result<(), LibraryError> {
    if body == Some(path) {
        Ok(())
    } else {
        Err(LibraryError::IdentifierMismatch { path, body })
    }
}

/// New records may not reuse an identifier that is already stored.
pub fn check_absent_id(
    entity: &'static str,
    id: Option<i64>,
    exists: impl FnOnce(i64) -> bool,
) -> Result<(), LibraryError> {
    match id {
        Some(id) if exists(id) => Err(LibraryError::IdentifierMustBeAbsent(entity)),
        _ => Ok(()),
    }
}

/// Turn a missing lookup into `NotFound`.
pub fn require_found<T>(
    found: Option<T>,
    missing: impl FnOnce() -> LibraryError,
) -> Result<T, LibraryError> {
    found.ok_or_else(missing)
}
