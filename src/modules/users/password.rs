use serde::Deserialize;

use crate::modules::error::LibraryError;

/// Body of a password change request.
///
/// `old_password` is accepted for compatibility with existing clients but is
/// not compared against the stored hash.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChange {
    #[serde(default)]
    pub old_password: Option<String>,
    pub password: String,
    pub verified_password: String,
}

impl PasswordChange {
    /// The new password, once it matches its confirmation exactly.
    pub fn validate(&self) -> Result<&str, LibraryError> {
        if self.password != self.verified_password {
            return Err(LibraryError::PasswordMismatch);
        }
        Ok(&self.password)
    }
}
