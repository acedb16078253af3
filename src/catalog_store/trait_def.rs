//! CatalogStore trait definition.

use super::models::{Book, BookFields, BookId, BookListing, Genre, GenreId};
use super::validation::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Storage backend for the book catalog.
///
/// Every operation commits or rolls back as a unit; readers never observe a
/// partial write.
pub trait CatalogStore: Send + Sync {
    /// Returns all genres, sorted by title.
    fn list_genres(&self) -> Result<Vec<Genre>, CatalogError>;

    /// Returns a genre by id, or None if it does not exist.
    fn get_genre(&self, id: GenreId) -> Result<Option<Genre>, CatalogError>;

    /// Adds a genre, returning its id. The title must be non-empty and is
    /// unique at the storage layer.
    fn add_genre(&self, title: &str) -> Result<GenreId, CatalogError>;

    /// Returns all books joined with their genre titles, ordered by id
    /// ascending. Books with a missing or dangling genre reference yield an
    /// absent genre title rather than failing the listing.
    fn list_books(&self) -> Result<Vec<BookListing>, CatalogError>;

    /// Returns a single book row, or None if it does not exist.
    fn get_book(&self, id: BookId) -> Result<Option<Book>, CatalogError>;

    /// Validates and inserts a book, returning the assigned id.
    fn add_book(&self, fields: &BookFields) -> Result<BookId, CatalogError>;

    /// Replaces all mutable fields of an existing book in one statement.
    /// Fails with `NotFound` if the id does not exist. The genre reference
    /// is accepted without an existence check.
    fn update_book(&self, id: BookId, fields: &BookFields) -> Result<(), CatalogError>;

    /// Removes a book row. Fails with `NotFound` if the id does not exist;
    /// a repeated delete of the same id fails the same way.
    fn delete_book(&self, id: BookId) -> Result<(), CatalogError>;
}
