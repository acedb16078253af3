pub mod auth;
mod sqlite_user_store;
mod user_store;

pub use auth::{CredentialError, CredentialHasher};
pub use sqlite_user_store::SqliteUserStore;
pub use user_store::{CredentialStore, UserId};
