// SQLite-backed credential store

use std::path::Path;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto::ApiKeyCodec;
use crate::error::Result;

/// A named provider credential as persisted. The API key column only ever
/// holds ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredential {
    pub id: String,
    pub name: String,
    pub provider_name: String,
    pub model_name: String,
    pub api_key_encrypted: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub is_default: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Insertion input, carrying the plaintext API key that gets encrypted on
/// the way in.
#[derive(Debug, Clone)]
pub struct NewCredential {
    pub name: String,
    pub provider_name: String,
    pub model_name: String,
    pub api_key: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub is_default: bool,
}

pub struct CredentialStore {
    conn: Mutex<Connection>,
}

impl CredentialStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS llm_credentials (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                provider_name TEXT NOT NULL,
                model_name TEXT NOT NULL,
                api_key_encrypted TEXT NOT NULL,
                temperature REAL NOT NULL DEFAULT 0.7,
                max_tokens INTEGER NOT NULL DEFAULT 1000,
                is_default INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Persist a new credential. The plaintext API key passes through the
    /// codec before the write.
    pub fn insert(
        &self,
        codec: &ApiKeyCodec,
        credential: NewCredential,
    ) -> Result<StoredCredential> {
        let encrypted = codec.encrypt(&credential.api_key)?;
        let now = Utc::now().timestamp();
        let record = StoredCredential {
            id: Uuid::new_v4().to_string(),
            name: credential.name,
            provider_name: credential.provider_name,
            model_name: credential.model_name,
            api_key_encrypted: encrypted,
            temperature: credential.temperature,
            max_tokens: credential.max_tokens,
            is_default: credential.is_default,
            created_at: now,
            updated_at: now,
        };

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO llm_credentials
             (id, name, provider_name, model_name, api_key_encrypted,
              temperature, max_tokens, is_default, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.id,
                record.name,
                record.provider_name,
                record.model_name,
                record.api_key_encrypted,
                record.temperature,
                record.max_tokens,
                record.is_default,
                record.created_at,
                record.updated_at,
            ],
        )?;

        tracing::debug!("inserted credential {} ({})", record.name, record.id);
        Ok(record)
    }

    /// The credential flagged as default, or `None` when no row matches.
    /// Uniqueness of the flag is not enforced; the first match wins.
    pub fn get_default(&self) -> Result<Option<StoredCredential>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, provider_name, model_name, api_key_encrypted,
                    temperature, max_tokens, is_default, created_at, updated_at
             FROM llm_credentials WHERE is_default = 1 LIMIT 1",
        )?;

        let row = stmt
            .query_row([], |row| {
                Ok(StoredCredential {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    provider_name: row.get(2)?,
                    model_name: row.get(3)?,
                    api_key_encrypted: row.get(4)?,
                    temperature: row.get(5)?,
                    max_tokens: row.get(6)?,
                    is_default: row.get(7)?,
                    created_at: row.get(8)?,
                    updated_at: row.get(9)?,
                })
            })
            .optional()?;

        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, is_default: bool) -> NewCredential {
        NewCredential {
            name: name.to_string(),
            provider_name: "openai".to_string(),
            model_name: "gpt-4o".to_string(),
            api_key: "sk-test-123".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            is_default,
        }
    }

    #[test]
    fn test_get_default_on_empty_store() {
        let store = CredentialStore::open_in_memory().unwrap();
        assert!(store.get_default().unwrap().is_none());
    }

    #[test]
    fn test_insert_never_stores_plaintext() {
        let store = CredentialStore::open_in_memory().unwrap();
        let codec = ApiKeyCodec::new("test-secret");

        let stored = store.insert(&codec, sample("prod", true)).unwrap();
        assert_ne!(stored.api_key_encrypted, "sk-test-123");
        assert!(!stored.api_key_encrypted.contains("sk-test"));
        assert_eq!(codec.decrypt(&stored.api_key_encrypted).unwrap(), "sk-test-123");
    }

    #[test]
    fn test_get_default_finds_flagged_row() {
        let store = CredentialStore::open_in_memory().unwrap();
        let codec = ApiKeyCodec::new("test-secret");

        store.insert(&codec, sample("secondary", false)).unwrap();
        let inserted = store.insert(&codec, sample("primary", true)).unwrap();

        let found = store.get_default().unwrap().unwrap();
        assert_eq!(found.id, inserted.id);
        assert_eq!(found.name, "primary");
        assert!(found.is_default);
    }

    #[test]
    fn test_non_default_rows_are_not_returned() {
        let store = CredentialStore::open_in_memory().unwrap();
        let codec = ApiKeyCodec::new("test-secret");

        store.insert(&codec, sample("secondary", false)).unwrap();
        assert!(store.get_default().unwrap().is_none());
    }
}
