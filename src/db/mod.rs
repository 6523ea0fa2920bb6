pub mod config;
pub mod operations;
pub mod schema;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::config::{DbConfig, DbConfigError};

/// SQLite-backed persistence for mastery rows and the curriculum tables.
#[derive(Clone)]
pub struct DatabaseProxy {
    config: DbConfig,
    pool: SqlitePool,
}

impl DatabaseProxy {
    pub async fn from_env() -> Result<Self, DbInitError> {
        let config = DbConfig::from_env()?;
        Self::connect(config).await
    }

    pub async fn connect(config: DbConfig) -> Result<Self, DbInitError> {
        let options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .journal_mode(config.journal_mode.as_sqlx())
            .busy_timeout(config.busy_timeout);

        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
        if config.is_in_memory() {
            // every connection to :memory: is its own database; a dropped one takes it along
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        }
        let pool = pool_options.connect_with(options).await?;

        schema::migrate(&pool).await?;
        tracing::info!(url = %config.database_url, "mastery database ready");

        Ok(Self { config, pool })
    }

    pub async fn in_memory() -> Result<Self, DbInitError> {
        Self::connect(DbConfig::in_memory()).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn connection_string(&self) -> &str {
        &self.config.database_url
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error(transparent)]
    Config(#[from] DbConfigError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
