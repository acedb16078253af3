mod placeholder;
mod store;

pub use placeholder::{ImageCanvas, PlaceholderCanvas};
pub use store::{AssetError, AssetRef, AssetStore};
