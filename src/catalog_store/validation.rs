//! Validation for catalog entities.
//!
//! Required fields are checked before anything reaches the storage layer;
//! the database's NOT NULL constraints are only a backstop.

use super::models::BookFields;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{field}' is required but was empty")]
    EmptyField { field: &'static str },
}

/// Validates the caller-supplied fields of a book before insert or update.
/// Title and author must be non-empty after trimming; everything else is
/// optional, including the genre reference (no existence check anywhere).
pub fn validate_book_fields(fields: &BookFields) -> Result<(), ValidationError> {
    if fields.title.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "title" });
    }
    if fields.author.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "author" });
    }
    Ok(())
}
