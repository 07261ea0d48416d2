//! Module for database connection setup and common utilities.
//!
//! This module is responsible for initializing the database connection pools
//! and providing a central point for database-related configurations.
//! Two pools are maintained: a read-write pool for command transactions and a
//! larger read-only pool for queries that never commit.

use crate::config::Config;
use anyhow::Result;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::time::Duration;

pub mod models;

pub struct Database {
    pool: SqlitePool,
    readonly_pool: SqlitePool,
}

impl Database {
    /// Initializes both connection pools.
    pub async fn new(config: &Config) -> Result<Self> {
        let acquire_timeout = Duration::from_secs(config.acquire_timeout_seconds);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(acquire_timeout)
            .test_before_acquire(true)
            .connect(&config.database_url)
            .await?;

        let readonly_pool = SqlitePoolOptions::new()
            .max_connections(config.readonly_max_connections)
            .acquire_timeout(acquire_timeout)
            .test_before_acquire(true)
            .connect(&config.database_url)
            .await?;

        Ok(Database {
            pool,
            readonly_pool,
        })
    }

    /// Returns the read-write connection pool used by unit-of-work commands.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the read-only connection pool used by query paths.
    pub fn readonly_pool(&self) -> &SqlitePool {
        &self.readonly_pool
    }

    /// Applies pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Closes both connection pools.
    pub async fn close(&self) {
        self.pool.close().await;
        self.readonly_pool.close().await;
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Database {
            pool: self.pool.clone(),
            readonly_pool: self.readonly_pool.clone(),
        }
    }
}
