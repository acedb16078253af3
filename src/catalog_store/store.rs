//! SQLite-backed catalog store implementation.

use super::models::{Book, BookFields, BookId, BookListing, Genre, GenreId};
use super::schema::CATALOG_VERSIONED_SCHEMA;
use super::trait_def::{CatalogError, CatalogStore};
use super::validation::{validate_book_fields, ValidationError};
use crate::asset_store::AssetRef;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Genres seeded into an empty catalog.
const DEFAULT_GENRES: &[&str] = &["Drama", "Science Fiction", "Comedy"];

/// SQLite-backed store for genres and books.
///
/// One connection, serialized behind a mutex; single-writer by construction.
#[derive(Clone)]
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    /// Opens (or creates) the catalog database, ensures the schema and seeds
    /// the default content when both tables are empty. Safe to call on every
    /// process start.
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let mut conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("Failed to open catalog database {:?}", db_path.as_ref()))?;
        CATALOG_VERSIONED_SCHEMA.ensure(&conn)?;
        Self::seed_if_empty(&mut conn)?;

        let book_count: i64 = conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        let genre_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM genres", [], |row| row.get(0))?;
        info!(
            "Opened catalog: {} books, {} genres",
            book_count, genre_count
        );

        Ok(SqliteCatalogStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Inserts the default genres and one sample book, only when both tables
    /// are empty, in a single transaction.
    fn seed_if_empty(conn: &mut Connection) -> Result<()> {
        let genre_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM genres", [], |row| row.get(0))?;
        let book_count: i64 = conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        if genre_count > 0 || book_count > 0 {
            return Ok(());
        }

        info!("Seeding empty catalog with default genres and a sample book");
        let tx = conn.transaction()?;
        for title in DEFAULT_GENRES {
            tx.execute("INSERT INTO genres (title) VALUES (?1)", params![title])?;
        }
        let first_genre: GenreId =
            tx.query_row("SELECT id FROM genres ORDER BY id LIMIT 1", [], |row| {
                row.get(0)
            })?;
        tx.execute(
            "INSERT INTO books (title, author, year, genre, image_path) VALUES (?1, ?2, ?3, ?4, NULL)",
            params!["Sample Book", "Sample Author", 2020, first_genre],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn parse_book_row(row: &rusqlite::Row) -> rusqlite::Result<Book> {
        Ok(Book {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            year: row.get(3)?,
            genre: row.get(4)?,
            image_path: row.get::<_, Option<String>>(5)?.map(AssetRef::new),
        })
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn list_genres(&self) -> Result<Vec<Genre>, CatalogError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT id, title FROM genres ORDER BY title")?;
        let genres = stmt
            .query_map([], |row| {
                Ok(Genre {
                    id: row.get(0)?,
                    title: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(genres)
    }

    fn get_genre(&self, id: GenreId) -> Result<Option<Genre>, CatalogError> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT id, title FROM genres WHERE id = ?1",
            params![id],
            |row| {
                Ok(Genre {
                    id: row.get(0)?,
                    title: row.get(1)?,
                })
            },
        ) {
            Ok(genre) => Ok(Some(genre)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn add_genre(&self, title: &str) -> Result<GenreId, CatalogError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyField { field: "title" }.into());
        }
        let conn = self.conn.lock().unwrap();
        conn.execute("INSERT INTO genres (title) VALUES (?1)", params![title])?;
        Ok(conn.last_insert_rowid())
    }

    fn list_books(&self) -> Result<Vec<BookListing>, CatalogError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT b.id, b.title, b.author, b.year, g.title, b.image_path
             FROM books b
             LEFT JOIN genres g ON b.genre = g.id
             ORDER BY b.id",
        )?;
        let listings = stmt
            .query_map([], |row| {
                Ok(BookListing {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    author: row.get(2)?,
                    year: row.get(3)?,
                    genre_title: row.get(4)?,
                    image_path: row.get::<_, Option<String>>(5)?.map(AssetRef::new),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(listings)
    }

    fn get_book(&self, id: BookId) -> Result<Option<Book>, CatalogError> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT id, title, author, year, genre, image_path FROM books WHERE id = ?1",
            params![id],
            Self::parse_book_row,
        ) {
            Ok(book) => Ok(Some(book)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn add_book(&self, fields: &BookFields) -> Result<BookId, CatalogError> {
        validate_book_fields(fields)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO books (title, author, year, genre, image_path)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                fields.title,
                fields.author,
                fields.year,
                fields.genre,
                fields.image_path.as_ref().map(|r| r.as_str()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update_book(&self, id: BookId, fields: &BookFields) -> Result<(), CatalogError> {
        validate_book_fields(fields)?;
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE books SET title = ?1, author = ?2, year = ?3, genre = ?4, image_path = ?5
             WHERE id = ?6",
            params![
                fields.title,
                fields.author,
                fields.year,
                fields.genre,
                fields.image_path.as_ref().map(|r| r.as_str()),
                id,
            ],
        )?;
        if updated == 0 {
            return Err(CatalogError::NotFound { entity: "book", id });
        }
        Ok(())
    }

    fn delete_book(&self, id: BookId) -> Result<(), CatalogError> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM books WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(CatalogError::NotFound { entity: "book", id });
        }
        Ok(())
    }
}
