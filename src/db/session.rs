//! Session message store

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::DbPool;
use crate::{Error, Result};

/// A stored conversation message
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub id: String,
    pub session_key: String,
    pub role: StoredRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Role of a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredRole {
    User,
    Assistant,
}

impl StoredRole {
    const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// Port for the conversation session store
///
/// The agent reads history through this and the reset path clears it;
/// tests substitute an in-memory pool or a stub.
pub trait SessionStore: Send + Sync {
    /// Last `limit` messages for a session, in chronological order
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable
    fn history(&self, session_key: &str, limit: usize) -> Result<Vec<StoredMessage>>;

    /// Append one message to a session
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable
    fn append(&self, session_key: &str, role: StoredRole, content: &str) -> Result<()>;

    /// Delete all messages for a session
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable
    fn clear(&self, session_key: &str) -> Result<()>;
}

/// SQLite-backed session repository
#[derive(Clone)]
pub struct SessionRepo {
    pool: DbPool,
}

impl SessionRepo {
    /// Create a new session repository
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<super::DbConn> {
        self.pool.get().map_err(|e| Error::Database(e.to_string()))
    }
}

impl SessionStore for SessionRepo {
    fn history(&self, session_key: &str, limit: usize) -> Result<Vec<StoredMessage>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare(
                "SELECT id, session_key, role, content, created_at
                 FROM messages WHERE session_key = ?1
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            )
            .map_err(|e| Error::Database(e.to_string()))?;

        #[allow(clippy::cast_possible_wrap)]
        let messages: Vec<StoredMessage> = stmt
            .query_map(rusqlite::params![session_key, limit as i64], |row| {
                Ok(StoredMessage {
                    id: row.get(0)?,
                    session_key: row.get(1)?,
                    role: StoredRole::from_str(&row.get::<_, String>(2)?)
                        .unwrap_or(StoredRole::User),
                    content: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?
            .filter_map(std::result::Result::ok)
            .collect();

        // Reverse to chronological order
        Ok(messages.into_iter().rev().collect())
    }

    fn append(&self, session_key: &str, role: StoredRole, content: &str) -> Result<()> {
        let conn = self.conn()?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO messages (id, session_key, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![&id, session_key, role.as_str(), content, &now],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    fn clear(&self, session_key: &str) -> Result<()> {
        let conn = self.conn()?;

        conn.execute("DELETE FROM messages WHERE session_key = ?1", [session_key])
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
