//! Password hashing for the credential store.
//!
//! Credentials are stored as hex-encoded PBKDF2-HMAC-SHA256 digests next to a
//! hex-encoded random salt. Verification re-derives the digest with the
//! stored salt and compares in constant time.

use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

#[cfg(not(feature = "test-fast-hasher"))]
const PBKDF2_ITERATIONS: u32 = 100_000;
#[cfg(feature = "test-fast-hasher")]
const PBKDF2_ITERATIONS: u32 = 1_000;

const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("{0} must not be empty")]
    InvalidInput(&'static str),

    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error("no user named '{0}'")]
    UserNotFound(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("stored credential record is malformed: {0}")]
    CorruptRecord(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// The key derivation scheme used for a stored credential.
///
/// A single variant today; the enum keeps room for rotating schemes without
/// touching call sites.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialHasher {
    Pbkdf2Sha256,
}

impl CredentialHasher {
    /// Generates a fresh random salt, hex encoded.
    pub fn generate_hex_salt(&self) -> String {
        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);
        hex::encode(salt)
    }

    /// Derives the hex-encoded digest of `password` under `hex_salt`.
    pub fn hash(&self, password: &str, hex_salt: &str) -> Result<String, CredentialError> {
        let salt = hex::decode(hex_salt)
            .map_err(|e| CredentialError::CorruptRecord(format!("bad salt: {}", e)))?;
        match self {
            CredentialHasher::Pbkdf2Sha256 => {
                let mut digest = [0u8; DIGEST_LEN];
                pbkdf2::pbkdf2_hmac::<Sha256>(
                    password.as_bytes(),
                    &salt,
                    PBKDF2_ITERATIONS,
                    &mut digest,
                );
                Ok(hex::encode(digest))
            }
        }
    }

    /// Re-derives and compares against `target_hex_hash` in constant time.
    pub fn verify(
        &self,
        password: &str,
        hex_salt: &str,
        target_hex_hash: &str,
    ) -> Result<bool, CredentialError> {
        let derived = self.hash(password, hex_salt)?;
        Ok(constant_time_compare(&derived, target_hex_hash))
    }
}

/// Compares two strings in time independent of where they first differ.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}
