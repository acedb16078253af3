//! Bookvault Library
//!
//! A local, credentialed book catalog: user accounts with salted password
//! hashing, a SQLite-backed catalog of genres and books, and a filesystem
//! store for cover images. This library exposes the internal modules for
//! testing and potential reuse.

pub mod asset_store;
pub mod catalog_store;
pub mod service;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use asset_store::{AssetRef, AssetStore};
pub use catalog_store::{CatalogStore, SqliteCatalogStore};
pub use service::{BookDetails, CatalogService, CatalogSession, PickedImage, ServiceError};
pub use user::{CredentialStore, SqliteUserStore};
