mod models;
mod schema;
mod store;
mod trait_def;
mod validation;

pub use models::{Book, BookFields, BookId, BookListing, Genre, GenreId};
pub use schema::CATALOG_VERSIONED_SCHEMA;
pub use store::SqliteCatalogStore;
pub use trait_def::{CatalogError, CatalogStore};
pub use validation::{validate_book_fields, ValidationError};
