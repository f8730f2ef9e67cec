use crate::api::models::Session;
use crate::error::{ClientError, Result};
use directories::ProjectDirs;
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};

const KEY_USER_ID: &str = "userId";
const KEY_USERNAME: &str = "username";
const KEY_TOKEN: &str = "token";

fn default_db_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("com", "carrier", "CarrierMessenger")?;
    Some(proj.data_dir().join("session.sqlite"))
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Persistent key/value store holding the logged-in identity between runs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        ensure_dir(&path)?;
        let store = Self { path };
        store
            .conn()?
            .execute_batch(
                r#"
                PRAGMA journal_mode = WAL;
                CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );
                "#,
            )?;
        Ok(store)
    }

    pub fn open_default() -> Result<Self> {
        let path = default_db_path().ok_or_else(|| ClientError::Config("no data directory".into()))?;
        Self::open(path)
    }

    fn conn(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    fn read(conn: &Connection, key: &str) -> Result<Option<String>> {
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, session: &Session) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for (key, value) in [(KEY_USER_ID, &session.user_id), (KEY_USERNAME, &session.username)] {
            tx.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
        }
        match &session.token {
            Some(token) => {
                tx.execute(
                    "INSERT INTO kv (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    params![KEY_TOKEN, token],
                )?;
            }
            None => {
                tx.execute("DELETE FROM kv WHERE key = ?1", params![KEY_TOKEN])?;
            }
        }
        tx.commit()?;
        info!("stored session for {}", session.username);
        Ok(())
    }

    /// Both `userId` and `username` must be present for a session to exist.
    pub fn get(&self) -> Result<Option<Session>> {
        let conn = self.conn()?;
        let user_id = Self::read(&conn, KEY_USER_ID)?;
        let username = Self::read(&conn, KEY_USERNAME)?;
        let token = Self::read(&conn, KEY_TOKEN)?;
        Ok(match (user_id, username) {
            (Some(user_id), Some(username)) => Some(Session { user_id, username, token }),
            _ => None,
        })
    }

    pub fn clear(&self) -> Result<()> {
        self.conn()?.execute("DELETE FROM kv", [])?;
        info!("cleared stored session");
        Ok(())
    }
}
