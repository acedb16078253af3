//! Composition root tying the credential, catalog and asset stores together.
//!
//! Catalog mutations are only reachable through a [`CatalogSession`], which
//! can only be obtained from [`CatalogService::login`]. The type system is
//! the gate; there is no runtime "am I logged in" flag to forget.

use crate::asset_store::{AssetError, AssetRef, AssetStore};
use crate::catalog_store::{
    Book, BookFields, BookId, BookListing, CatalogError, CatalogStore, Genre, GenreId,
};
use crate::user::{CredentialError, CredentialStore, UserId};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Raw image bytes picked by the caller, with the extension of the original
/// file so the stored copy keeps a recognizable name.
pub struct PickedImage {
    pub bytes: Vec<u8>,
    pub extension: String,
}

/// A book row joined with everything needed to display it: the resolved
/// genre title and an image path that always points at a real file.
pub struct BookDetails {
    pub book: Book,
    pub genre_title: Option<String>,
    pub image: PathBuf,
}

pub struct CatalogService {
    users: Arc<dyn CredentialStore>,
    catalog: Arc<dyn CatalogStore>,
    assets: AssetStore,
}

impl CatalogService {
    pub fn new(
        users: Arc<dyn CredentialStore>,
        catalog: Arc<dyn CatalogStore>,
        assets: AssetStore,
    ) -> Self {
        CatalogService {
            users,
            catalog,
            assets,
        }
    }

    /// Creates a new user account. Does not log the user in.
    pub fn register(&self, username: &str, password: &str) -> Result<UserId, ServiceError> {
        Ok(self.users.register(username, password)?)
    }

    /// Verifies credentials and opens a session. Every catalog operation
    /// hangs off the returned session.
    pub fn login(&self, username: &str, password: &str) -> Result<CatalogSession<'_>, ServiceError> {
        let user_id = self.users.authenticate(username, password)?;
        info!("User '{}' logged in", username);
        Ok(CatalogSession {
            service: self,
            user_id,
        })
    }
}

/// An authenticated view of the catalog, borrowed from the service.
pub struct CatalogSession<'a> {
    service: &'a CatalogService,
    user_id: UserId,
}

impl std::fmt::Debug for CatalogSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogSession")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl CatalogSession<'_> {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn username(&self) -> Option<String> {
        self.service.users.get_username(self.user_id)
    }

    pub fn list_genres(&self) -> Result<Vec<Genre>, ServiceError> {
        Ok(self.service.catalog.list_genres()?)
    }

    pub fn add_genre(&self, title: &str) -> Result<GenreId, ServiceError> {
        Ok(self.service.catalog.add_genre(title)?)
    }

    pub fn list_books(&self) -> Result<Vec<BookListing>, ServiceError> {
        Ok(self.service.catalog.list_books()?)
    }

    /// Adds a book, storing the picked image first so the row never refers
    /// to an image that was not written.
    pub fn add_book(
        &self,
        mut fields: BookFields,
        image: Option<PickedImage>,
    ) -> Result<BookId, ServiceError> {
        fields.image_path = match image {
            Some(picked) => Some(self.store_image(&picked)?),
            None => None,
        };
        Ok(self.service.catalog.add_book(&fields)?)
    }

    /// Replaces a book's fields. A picked image supersedes the stored one;
    /// without one the previous image reference is carried forward.
    pub fn update_book(
        &self,
        id: BookId,
        mut fields: BookFields,
        image: Option<PickedImage>,
    ) -> Result<(), ServiceError> {
        fields.image_path = match image {
            Some(picked) => Some(self.store_image(&picked)?),
            None => self
                .service
                .catalog
                .get_book(id)?
                .and_then(|book| book.image_path),
        };
        Ok(self.service.catalog.update_book(id, &fields)?)
    }

    pub fn delete_book(&self, id: BookId) -> Result<(), ServiceError> {
        Ok(self.service.catalog.delete_book(id)?)
    }

    /// Loads one book with its genre title and a displayable image path.
    /// The image path falls back to the placeholder, so it always exists.
    pub fn book_details(&self, id: BookId) -> Result<Option<BookDetails>, ServiceError> {
        let Some(book) = self.service.catalog.get_book(id)? else {
            return Ok(None);
        };
        let genre_title = match book.genre {
            Some(genre_id) => self
                .service
                .catalog
                .get_genre(genre_id)?
                .map(|genre| genre.title),
            None => None,
        };
        let image = self.service.assets.resolve(book.image_path.as_ref());
        Ok(Some(BookDetails {
            book,
            genre_title,
            image,
        }))
    }

    fn store_image(&self, picked: &PickedImage) -> Result<AssetRef, ServiceError> {
        Ok(self
            .service
            .assets
            .store_image(&picked.bytes, &picked.extension)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::SqliteCatalogStore;
    use crate::user::SqliteUserStore;
    use tempfile::TempDir;

    fn create_tmp_service() -> (CatalogService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("library.db");
        let users = SqliteUserStore::new(&db_path).unwrap();
        let catalog = SqliteCatalogStore::new(&db_path).unwrap();
        let assets = AssetStore::new(temp_dir.path());
        assets.init().unwrap();
        let service = CatalogService::new(Arc::new(users), Arc::new(catalog), assets);
        (service, temp_dir)
    }

    fn make_fields(title: &str) -> BookFields {
        BookFields {
            title: title.to_string(),
            author: "Author".to_string(),
            year: Some(2001),
            genre: None,
            image_path: None,
        }
    }

    #[test]
    fn login_requires_registration() {
        let (service, _temp_dir) = create_tmp_service();

        assert!(matches!(
            service.login("alice", "s3cret").unwrap_err(),
            ServiceError::Credential(CredentialError::UserNotFound(_))
        ));

        service.register("alice", "s3cret").unwrap();
        let session = service.login("alice", "s3cret").unwrap();
        assert_eq!(session.username().as_deref(), Some("alice"));
    }

    #[test]
    fn login_rejects_wrong_password() {
        let (service, _temp_dir) = create_tmp_service();

        service.register("alice", "s3cret").unwrap();
        assert!(matches!(
            service.login("alice", "wrong").unwrap_err(),
            ServiceError::Credential(CredentialError::InvalidCredentials)
        ));
    }

    #[test]
    fn add_book_with_image_stores_it() {
        let (service, _temp_dir) = create_tmp_service();
        service.register("alice", "s3cret").unwrap();
        let session = service.login("alice", "s3cret").unwrap();

        let id = session
            .add_book(
                make_fields("Dune"),
                Some(PickedImage {
                    bytes: b"cover bytes".to_vec(),
                    extension: "png".to_string(),
                }),
            )
            .unwrap();

        let details = session.book_details(id).unwrap().unwrap();
        assert!(details.book.image_path.is_some());
        assert!(details.image.exists());
        assert_eq!(std::fs::read(&details.image).unwrap(), b"cover bytes");
    }

    #[test]
    fn book_without_image_resolves_to_placeholder() {
        let (service, _temp_dir) = create_tmp_service();
        service.register("alice", "s3cret").unwrap();
        let session = service.login("alice", "s3cret").unwrap();

        let id = session.add_book(make_fields("Dune"), None).unwrap();
        let details = session.book_details(id).unwrap().unwrap();
        assert!(details.book.image_path.is_none());
        assert!(details.image.ends_with("images/placeholder.png"));
        assert!(details.image.exists());
    }

    #[test]
    fn update_without_image_keeps_the_previous_one() {
        let (service, _temp_dir) = create_tmp_service();
        service.register("alice", "s3cret").unwrap();
        let session = service.login("alice", "s3cret").unwrap();

        let id = session
            .add_book(
                make_fields("Dune"),
                Some(PickedImage {
                    bytes: b"original cover".to_vec(),
                    extension: "jpg".to_string(),
                }),
            )
            .unwrap();
        let original_ref = session
            .book_details(id)
            .unwrap()
            .unwrap()
            .book
            .image_path
            .unwrap();

        session
            .update_book(id, make_fields("Dune Messiah"), None)
            .unwrap();

        let details = session.book_details(id).unwrap().unwrap();
        assert_eq!(details.book.title, "Dune Messiah");
        assert_eq!(details.book.image_path, Some(original_ref));
    }

    #[test]
    fn update_with_image_replaces_the_reference() {
        let (service, _temp_dir) = create_tmp_service();
        service.register("alice", "s3cret").unwrap();
        let session = service.login("alice", "s3cret").unwrap();

        let id = session
            .add_book(
                make_fields("Dune"),
                Some(PickedImage {
                    bytes: b"original cover".to_vec(),
                    extension: "jpg".to_string(),
                }),
            )
            .unwrap();
        let original_ref = session
            .book_details(id)
            .unwrap()
            .unwrap()
            .book
            .image_path
            .unwrap();

        session
            .update_book(
                id,
                make_fields("Dune"),
                Some(PickedImage {
                    bytes: b"new cover".to_vec(),
                    extension: "jpg".to_string(),
                }),
            )
            .unwrap();

        let details = session.book_details(id).unwrap().unwrap();
        let new_ref = details.book.image_path.unwrap();
        assert_ne!(new_ref, original_ref);
        assert_eq!(std::fs::read(&details.image).unwrap(), b"new cover");
    }

    #[test]
    fn book_details_resolves_genre_title() {
        let (service, _temp_dir) = create_tmp_service();
        service.register("alice", "s3cret").unwrap();
        let session = service.login("alice", "s3cret").unwrap();

        let genre_id = session.add_genre("Space Opera").unwrap();
        let mut fields = make_fields("Dune");
        fields.genre = Some(genre_id);
        let id = session.add_book(fields, None).unwrap();

        let details = session.book_details(id).unwrap().unwrap();
        assert_eq!(details.genre_title.as_deref(), Some("Space Opera"));
    }

    #[test]
    fn book_details_for_missing_book_is_none() {
        let (service, _temp_dir) = create_tmp_service();
        service.register("alice", "s3cret").unwrap();
        let session = service.login("alice", "s3cret").unwrap();

        assert!(session.book_details(424242).unwrap().is_none());
    }
}
