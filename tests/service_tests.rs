use bookvault::catalog_store::BookFields;
use bookvault::{AssetStore, CatalogService, PickedImage, SqliteCatalogStore, SqliteUserStore};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn open_service(dir: &TempDir) -> CatalogService {
    let db_path = dir.path().join("library.db");
    let users = SqliteUserStore::new(&db_path).unwrap();
    let catalog = SqliteCatalogStore::new(&db_path).unwrap();
    let assets = AssetStore::new(dir.path());
    assets.init().unwrap();
    CatalogService::new(Arc::new(users), Arc::new(catalog), assets)
}

fn dune() -> BookFields {
    BookFields {
        title: "Dune".to_string(),
        author: "Herbert".to_string(),
        year: Some(1965),
        genre: Some(2),
        image_path: None,
    }
}

#[test]
fn register_login_add_list_delete() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);

    service.register("alice", "s3cret").unwrap();
    let session = service.login("alice", "s3cret").unwrap();

    let id = session.add_book(dune(), None).unwrap();

    let listings = session.list_books().unwrap();
    let listing = listings.iter().find(|b| b.id == id).unwrap();
    assert_eq!(listing.title, "Dune");
    assert_eq!(listing.author, "Herbert");
    assert_eq!(listing.year, Some(1965));
    // Genre 2 exists in the seeded catalog, so the join resolves a title
    assert!(listing.genre_title.is_some());

    session.delete_book(id).unwrap();
    assert!(!session.list_books().unwrap().iter().any(|b| b.id == id));
}

#[test]
fn catalog_survives_reopening() {
    let dir = TempDir::new().unwrap();

    let id = {
        let service = open_service(&dir);
        service.register("alice", "s3cret").unwrap();
        let session = service.login("alice", "s3cret").unwrap();
        session
            .add_book(
                dune(),
                Some(PickedImage {
                    bytes: b"cover".to_vec(),
                    extension: "png".to_string(),
                }),
            )
            .unwrap()
    };

    let service = open_service(&dir);
    let session = service.login("alice", "s3cret").unwrap();
    let details = session.book_details(id).unwrap().unwrap();
    assert_eq!(details.book.title, "Dune");
    assert_eq!(std::fs::read(&details.image).unwrap(), b"cover");
}

#[test]
fn every_listed_book_has_a_displayable_image() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);

    service.register("alice", "s3cret").unwrap();
    let session = service.login("alice", "s3cret").unwrap();

    session.add_book(dune(), None).unwrap();
    session
        .add_book(
            BookFields {
                title: "Solaris".to_string(),
                author: "Lem".to_string(),
                year: Some(1961),
                genre: None,
                image_path: None,
            },
            Some(PickedImage {
                bytes: b"solaris cover".to_vec(),
                extension: "jpg".to_string(),
            }),
        )
        .unwrap();

    for listing in session.list_books().unwrap() {
        let details = session.book_details(listing.id).unwrap().unwrap();
        assert!(details.image.is_absolute());
        assert!(details.image.exists());
    }
}

#[test]
fn sessions_are_scoped_to_their_service() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);

    service.register("alice", "s3cret").unwrap();
    service.register("bob", "hunter2").unwrap();

    let alice = service.login("alice", "s3cret").unwrap();
    let bob = service.login("bob", "hunter2").unwrap();
    assert_ne!(alice.user_id(), bob.user_id());

    // Both sessions see the same shared catalog
    let id = alice.add_book(dune(), None).unwrap();
    assert!(bob.list_books().unwrap().iter().any(|b| b.id == id));
}

#[test]
fn stored_image_paths_stay_inside_the_images_dir() {
    let dir = TempDir::new().unwrap();
    let service = open_service(&dir);

    service.register("alice", "s3cret").unwrap();
    let session = service.login("alice", "s3cret").unwrap();

    let id = session
        .add_book(
            dune(),
            Some(PickedImage {
                bytes: b"cover".to_vec(),
                extension: "../../png".to_string(),
            }),
        )
        .unwrap();

    let details = session.book_details(id).unwrap().unwrap();
    let images_dir: PathBuf = dir.path().join("images").canonicalize().unwrap();
    assert!(details.image.canonicalize().unwrap().starts_with(&images_dir));
}
