//! SQLite-backed token store, one row per credential name.

use super::{encryption, Credentials};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Encrypted OAuth token storage.
///
/// # Schema
/// ```sql
/// CREATE TABLE oauth_tokens (
///     credential TEXT PRIMARY KEY,
///     access_token TEXT NOT NULL,   -- sealed
///     refresh_token TEXT,           -- sealed (optional)
///     expires_at TEXT,              -- RFC 3339 (optional)
///     updated_at TEXT NOT NULL
/// );
/// ```
pub struct CredentialStore {
    conn: Mutex<Connection>,
    key: Vec<u8>,
}

impl CredentialStore {
    /// Opens (or creates) the store at `db_path`. `encryption_key` is a
    /// base64-encoded 32-byte key; `":memory:"` gives a throwaway store.
    pub fn new<P: AsRef<Path>>(db_path: P, encryption_key: &str) -> Result<Self> {
        let key = encryption::decode_key(encryption_key).context("Invalid encryption key")?;
        let conn = Connection::open(db_path).context("Failed to open credentials database")?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS oauth_tokens (
                credential TEXT PRIMARY KEY,
                access_token TEXT NOT NULL,
                refresh_token TEXT,
                expires_at TEXT,
                updated_at TEXT NOT NULL
            )
            "#,
            [],
        )
        .context("Failed to create oauth_tokens table")?;

        Ok(Self {
            conn: Mutex::new(conn),
            key,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Credential store lock poisoned"))
    }

    /// Stores tokens for `credential`, replacing any previous ones.
    pub fn store(&self, credential: &str, credentials: &Credentials) -> Result<()> {
        let access_token = encryption::seal(&credentials.access_token, &self.key)
            .context("Failed to encrypt access token")?;
        let refresh_token = credentials
            .refresh_token
            .as_deref()
            .map(|token| encryption::seal(token, &self.key))
            .transpose()
            .context("Failed to encrypt refresh token")?;
        let expires_at = credentials.expires_at.map(|dt| dt.to_rfc3339());

        self.conn()?
            .execute(
                r#"
                INSERT INTO oauth_tokens (credential, access_token, refresh_token, expires_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(credential) DO UPDATE SET
                    access_token = excluded.access_token,
                    refresh_token = excluded.refresh_token,
                    expires_at = excluded.expires_at,
                    updated_at = excluded.updated_at
                "#,
                params![
                    credential,
                    access_token,
                    refresh_token,
                    expires_at,
                    Utc::now().to_rfc3339()
                ],
            )
            .context("Failed to store tokens")?;
        Ok(())
    }

    /// Returns the decrypted tokens for `credential`, if any.
    pub fn get(&self, credential: &str) -> Result<Option<Credentials>> {
        let row: Option<(String, Option<String>, Option<String>)> = self
            .conn()?
            .query_row(
                "SELECT access_token, refresh_token, expires_at FROM oauth_tokens WHERE credential = ?1",
                params![credential],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .context("Failed to read tokens")?;

        let Some((access_token, refresh_token, expires_at)) = row else {
            return Ok(None);
        };

        let access_token =
            encryption::open(&access_token, &self.key).context("Failed to decrypt access token")?;
        let refresh_token = refresh_token
            .map(|sealed| encryption::open(&sealed, &self.key))
            .transpose()
            .context("Failed to decrypt refresh token")?;
        let expires_at = expires_at
            .map(|s| DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc)))
            .transpose()
            .context("Failed to parse expires_at")?;

        Ok(Some(Credentials {
            access_token,
            refresh_token,
            expires_at,
        }))
    }

    /// Removes tokens for `credential`. Returns whether a row existed.
    pub fn delete(&self, credential: &str) -> Result<bool> {
        let removed = self
            .conn()?
            .execute("DELETE FROM oauth_tokens WHERE credential = ?1", params![credential])
            .context("Failed to delete tokens")?;
        Ok(removed > 0)
    }
}
