use std::time::Duration;

use thiserror::Error;

const IN_MEMORY_URL: &str = "sqlite::memory:";

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub busy_timeout: Duration,
    pub journal_mode: SqliteJournalMode,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, DbConfigError> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or(DbConfigError::Missing {
                key: "DATABASE_URL",
            })?;

        let journal_mode = std::env::var("SQLITE_JOURNAL_MODE")
            .ok()
            .as_deref()
            .and_then(SqliteJournalMode::parse)
            .unwrap_or(SqliteJournalMode::Wal);

        Ok(Self {
            database_url,
            max_connections: env_u32("DB_MAX_CONNECTIONS", 5).max(1),
            busy_timeout: Duration::from_millis(env_u64("SQLITE_BUSY_TIMEOUT_MS", 5000)),
            journal_mode,
        })
    }

    /// Private in-memory database. Pinned to one connection since every
    /// SQLite memory connection is its own database.
    pub fn in_memory() -> Self {
        Self {
            database_url: IN_MEMORY_URL.to_string(),
            max_connections: 1,
            busy_timeout: Duration::from_millis(5000),
            journal_mode: SqliteJournalMode::Memory,
        }
    }

    pub fn file(path: &std::path::Path) -> Self {
        Self {
            database_url: format!("sqlite:{}?mode=rwc", path.display()),
            max_connections: 5,
            busy_timeout: Duration::from_millis(5000),
            journal_mode: SqliteJournalMode::Wal,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqliteJournalMode {
    Wal,
    Delete,
    Memory,
}

impl SqliteJournalMode {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "WAL" => Some(Self::Wal),
            "DELETE" => Some(Self::Delete),
            "MEMORY" => Some(Self::Memory),
            _ => None,
        }
    }

    pub(crate) fn as_sqlx(self) -> sqlx::sqlite::SqliteJournalMode {
        match self {
            SqliteJournalMode::Wal => sqlx::sqlite::SqliteJournalMode::Wal,
            SqliteJournalMode::Delete => sqlx::sqlite::SqliteJournalMode::Delete,
            SqliteJournalMode::Memory => sqlx::sqlite::SqliteJournalMode::Memory,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbConfigError {
    #[error("Missing required env var: {key}")]
    Missing { key: &'static str },
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .unwrap_or(default)
}
