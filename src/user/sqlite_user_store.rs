use super::auth::{CredentialError, CredentialHasher};
use super::user_store::{CredentialStore, UserId};
use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

const USERS_TABLE: Table = Table {
    name: "users",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("username", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("pwd_hash", &SqlType::Text, non_null = true),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
    ],
    indices: &[("idx_users_username", "username")],
};

pub const USER_VERSIONED_SCHEMA: VersionedSchema = VersionedSchema {
    version: 0,
    tables: &[USERS_TABLE],
};

/// SQLite-backed credential store.
///
/// One connection, serialized behind a mutex; rows are written at
/// registration and never mutated afterwards.
#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
    hasher: CredentialHasher,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("Failed to open user database {:?}", db_path.as_ref()))?;
        USER_VERSIONED_SCHEMA.ensure(&conn)?;

        let user_count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        info!("Opened credential store with {} users", user_count);

        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
            hasher: CredentialHasher::Pbkdf2Sha256,
        })
    }

    fn find_user(
        conn: &Connection,
        username: &str,
    ) -> Result<Option<(UserId, String, String)>, rusqlite::Error> {
        match conn.query_row(
            "SELECT id, pwd_hash, salt FROM users WHERE username = ?1",
            params![username],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        ) {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl CredentialStore for SqliteUserStore {
    fn register(&self, username: &str, password: &str) -> Result<UserId, CredentialError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(CredentialError::InvalidInput("username"));
        }
        if password.trim().is_empty() {
            return Err(CredentialError::InvalidInput("password"));
        }

        let conn = self.conn.lock().unwrap();
        if Self::find_user(&conn, username)?.is_some() {
            return Err(CredentialError::DuplicateUsername(username.to_string()));
        }

        let salt = self.hasher.generate_hex_salt();
        let hash = self.hasher.hash(password, &salt)?;
        conn.execute(
            "INSERT INTO users (username, pwd_hash, salt) VALUES (?1, ?2, ?3)",
            params![username, hash, salt],
        )?;
        let user_id = conn.last_insert_rowid();
        info!("Registered user '{}' with id {}", username, user_id);
        Ok(user_id)
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<UserId, CredentialError> {
        let username = username.trim();
        let conn = self.conn.lock().unwrap();
        let (user_id, stored_hash, stored_salt) = Self::find_user(&conn, username)?
            .ok_or_else(|| CredentialError::UserNotFound(username.to_string()))?;
        drop(conn);

        if self.hasher.verify(password, &stored_salt, &stored_hash)? {
            Ok(user_id)
        } else {
            Err(CredentialError::InvalidCredentials)
        }
    }

    fn get_username(&self, user_id: UserId) -> Option<String> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT username FROM users WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .ok()
    }
}
