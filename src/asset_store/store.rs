//! Filesystem store for book cover images.
//!
//! Images live under `<base>/images/` with collision-resistant generated
//! names; `placeholder.png` is a reserved name inside that directory,
//! synthesized on first use. Writes only ever create new files; replacing a
//! book's cover leaves the old file in place.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::placeholder::{render_placeholder, ImageCanvas, PlaceholderCanvas};

const IMAGES_DIR: &str = "images";
const PLACEHOLDER_FILE: &str = "placeholder.png";
const PLACEHOLDER_SIZE: (u32, u32) = (200, 280);
const PLACEHOLDER_BACKGROUND: (u8, u8, u8) = (230, 230, 230);
const PLACEHOLDER_CAPTION: &str = "No Image";

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Opaque reference to a stored image, relative to the asset store base
/// directory. Issued by `AssetStore::store_image`; treat as a token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new<S: Into<String>>(value: S) -> Self {
        AssetRef(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct AssetStore {
    base_dir: PathBuf,
}

impl AssetStore {
    /// Creates a store rooted at `base_dir`. Resolution always yields
    /// absolute paths, so a relative base is absolutized up front.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        let base_dir = base_dir.as_ref();
        let base_dir = match std::path::absolute(base_dir) {
            Ok(path) => path,
            Err(_) => base_dir.to_path_buf(),
        };
        AssetStore { base_dir }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.base_dir.join(IMAGES_DIR)
    }

    pub fn placeholder_path(&self) -> PathBuf {
        self.images_dir().join(PLACEHOLDER_FILE)
    }

    /// Creates the images directory and the placeholder. Called once at
    /// startup; safe to call repeatedly.
    pub fn init(&self) -> Result<(), AssetError> {
        std::fs::create_dir_all(self.images_dir())?;
        self.ensure_placeholder()?;
        Ok(())
    }

    /// Synthesizes the placeholder image if it is not on disk yet; no-op
    /// otherwise. Returns its path.
    pub fn ensure_placeholder(&self) -> Result<PathBuf, AssetError> {
        let path = self.placeholder_path();
        if path.exists() {
            return Ok(path);
        }
        std::fs::create_dir_all(self.images_dir())?;

        let (width, height) = PLACEHOLDER_SIZE;
        let mut canvas = ImageCanvas::new(width, height, PLACEHOLDER_BACKGROUND);
        render_placeholder(&mut canvas, PLACEHOLDER_CAPTION);
        canvas.save(&path)?;
        info!("Synthesized placeholder image at {:?}", path);
        Ok(path)
    }

    /// Persists image bytes under a freshly generated name and returns the
    /// reference. Names are never reused, so no existing file is ever
    /// overwritten.
    pub fn store_image(&self, bytes: &[u8], extension: &str) -> Result<AssetRef, AssetError> {
        std::fs::create_dir_all(self.images_dir())?;

        let name = match sanitize_extension(extension) {
            Some(ext) => format!("{}.{}", Uuid::new_v4().simple(), ext),
            None => Uuid::new_v4().simple().to_string(),
        };
        let path = self.images_dir().join(&name);

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        file.write_all(bytes)?;

        Ok(AssetRef(format!("{}/{}", IMAGES_DIR, name)))
    }

    /// Resolves a reference to an absolute path, falling back to the
    /// placeholder when the reference is absent or its file is gone. Total:
    /// always yields something displayable.
    pub fn resolve(&self, asset: Option<&AssetRef>) -> PathBuf {
        if let Some(asset) = asset {
            let path = self.base_dir.join(asset.as_str());
            if path.exists() {
                return path;
            }
        }
        match self.ensure_placeholder() {
            Ok(path) => path,
            Err(e) => {
                warn!("Could not materialize placeholder image: {}", e);
                self.placeholder_path()
            }
        }
    }
}

/// Normalizes a user-supplied extension: lowercase alphanumeric, no leading
/// dot, bounded length. Anything else is dropped.
fn sanitize_extension(extension: &str) -> Option<String> {
    let cleaned: String = extension
        .trim_start_matches('.')
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .take(8)
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_tmp_store() -> (AssetStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = AssetStore::new(temp_dir.path());
        store.init().unwrap();
        (store, temp_dir)
    }

    #[test]
    fn init_materializes_the_placeholder() {
        let (store, _temp_dir) = create_tmp_store();

        let path = store.placeholder_path();
        assert!(path.exists());
        assert_eq!(image::image_dimensions(&path).unwrap(), (200, 280));
    }

    #[test]
    fn ensure_placeholder_is_idempotent() {
        let (store, _temp_dir) = create_tmp_store();

        let first = store.ensure_placeholder().unwrap();
        let again = store.ensure_placeholder().unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn resolve_absent_ref_yields_placeholder() {
        let temp_dir = TempDir::new().unwrap();
        let store = AssetStore::new(temp_dir.path());

        // Deliberately no init: resolve must create the placeholder itself
        let path = store.resolve(None);
        assert_eq!(path, store.placeholder_path());
        assert!(path.exists());
    }

    #[test]
    fn resolve_dangling_ref_yields_placeholder() {
        let (store, _temp_dir) = create_tmp_store();

        let gone = AssetRef::new("images/deadbeef.png");
        assert_eq!(store.resolve(Some(&gone)), store.placeholder_path());
    }

    #[test]
    fn resolve_existing_ref_yields_its_absolute_path() {
        let (store, _temp_dir) = create_tmp_store();

        let asset = store.store_image(b"fake image bytes", "png").unwrap();
        let path = store.resolve(Some(&asset));
        assert!(path.is_absolute());
        assert!(path.ends_with(asset.as_str()));
        assert_eq!(std::fs::read(&path).unwrap(), b"fake image bytes");
    }

    #[test]
    fn storing_same_bytes_twice_yields_two_files() {
        let (store, _temp_dir) = create_tmp_store();

        let first = store.store_image(b"same bytes", "jpg").unwrap();
        let second = store.store_image(b"same bytes", "jpg").unwrap();
        assert_ne!(first, second);
        assert!(store.base_dir.join(first.as_str()).exists());
        assert!(store.base_dir.join(second.as_str()).exists());
    }

    #[test]
    fn extensions_are_sanitized() {
        assert_eq!(sanitize_extension(".PNG"), Some("png".to_string()));
        assert_eq!(sanitize_extension("jpeg"), Some("jpeg".to_string()));
        assert_eq!(sanitize_extension("../../etc"), Some("etc".to_string()));
        assert_eq!(sanitize_extension(""), None);
        assert_eq!(sanitize_extension("..."), None);
    }
}
