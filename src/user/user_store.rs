use super::auth::CredentialError;

pub type UserId = i64;

pub trait CredentialStore: Send + Sync {
    /// Registers a new user and returns its id.
    ///
    /// Fails with `InvalidInput` if the username or password is empty after
    /// trimming, and with `DuplicateUsername` on a case-sensitive exact
    /// match of an existing username. The password itself is hashed as
    /// supplied, untrimmed.
    fn register(&self, username: &str, password: &str) -> Result<UserId, CredentialError>;

    /// Verifies a username/password pair and returns the user's id.
    ///
    /// Fails with `UserNotFound` when no such username exists, and with
    /// `InvalidCredentials` when the re-derived hash does not match the
    /// stored one. Issues no session state; that belongs to the caller.
    fn authenticate(&self, username: &str, password: &str) -> Result<UserId, CredentialError>;

    /// Returns the username for an id, or None if the user does not exist.
    fn get_username(&self, user_id: UserId) -> Option<String>;
}
