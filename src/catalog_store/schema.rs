//! SQLite schema for the book catalog.
//!
//! `books.genre` declares a foreign key into `genres` but connections keep
//! SQLite's default `foreign_keys=OFF`: a dangling genre reference is
//! tolerated and listings render it as an absent genre title rather than
//! failing.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

const GENRES_TABLE: Table = Table {
    name: "genres",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true, is_unique = true),
    ],
    indices: &[],
};

const GENRE_FK: ForeignKey = ForeignKey {
    foreign_table: "genres",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::NoAction,
};

const BOOKS_TABLE: Table = Table {
    name: "books",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("author", &SqlType::Text, non_null = true),
        sqlite_column!("year", &SqlType::Integer),
        sqlite_column!("genre", &SqlType::Integer, foreign_key = Some(&GENRE_FK)),
        sqlite_column!("image_path", &SqlType::Text),
    ],
    indices: &[("idx_books_genre", "genre")],
};

pub const CATALOG_VERSIONED_SCHEMA: VersionedSchema = VersionedSchema {
    version: 0,
    tables: &[GENRES_TABLE, BOOKS_TABLE],
};

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn schema_creates_and_validates() {
        let conn = Connection::open_in_memory().unwrap();
        CATALOG_VERSIONED_SCHEMA.ensure(&conn).unwrap();
        CATALOG_VERSIONED_SCHEMA.validate(&conn).unwrap();
    }

    #[test]
    fn dangling_genre_reference_is_accepted() {
        let conn = Connection::open_in_memory().unwrap();
        CATALOG_VERSIONED_SCHEMA.ensure(&conn).unwrap();

        // foreign_keys stays OFF, so this insert must succeed
        conn.execute(
            "INSERT INTO books (title, author, year, genre, image_path)
             VALUES ('Orphan', 'Nobody', NULL, 999, NULL)",
            [],
        )
        .unwrap();

        let genre: Option<String> = conn
            .query_row(
                "SELECT g.title FROM books b LEFT JOIN genres g ON b.genre = g.id WHERE b.title = 'Orphan'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(genre, None);
    }

    #[test]
    fn genre_titles_are_unique() {
        let conn = Connection::open_in_memory().unwrap();
        CATALOG_VERSIONED_SCHEMA.ensure(&conn).unwrap();

        conn.execute("INSERT INTO genres (title) VALUES ('Drama')", [])
            .unwrap();
        let duplicate = conn.execute("INSERT INTO genres (title) VALUES ('Drama')", []);
        assert!(duplicate.is_err());
    }
}
