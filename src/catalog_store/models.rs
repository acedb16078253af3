//! Catalog entities for SQLite-backed storage.
//!
//! Rows are surfaced as named records; field access is by name, never by
//! tuple position.

use crate::asset_store::AssetRef;
use serde::{Deserialize, Serialize};

pub type GenreId = i64;
pub type BookId = i64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: GenreId,
    pub title: String,
}

/// A book row as persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub year: Option<i32>,
    /// Loose reference: accepted without an existence check, tolerated when
    /// dangling (listings render the genre as absent).
    pub genre: Option<GenreId>,
    pub image_path: Option<AssetRef>,
}

/// The mutable fields of a book, used for both insert and full-replace
/// update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub year: Option<i32>,
    pub genre: Option<GenreId>,
    pub image_path: Option<AssetRef>,
}

impl Book {
    pub fn fields(&self) -> BookFields {
        BookFields {
            title: self.title.clone(),
            author: self.author.clone(),
            year: self.year,
            genre: self.genre,
            image_path: self.image_path.clone(),
        }
    }
}

/// A book joined with its genre title for display. `genre_title` is None for
/// books without a genre or with a dangling genre reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BookListing {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub year: Option<i32>,
    pub genre_title: Option<String>,
    pub image_path: Option<AssetRef>,
}
