use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

use crate::database::sqlite::models::{ChunkRecord, NewChunkRecord, SourceSummary};
use crate::database::sqlite::queries::ChunkQueries;


pub mod models;
pub mod queries;

pub use models::*;
pub use queries::*;

pub type DbPool = Pool<Sqlite>;

#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        if let Some(parent) = database_path.as_ref().parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/database/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    pub async fn initialize_from_config_dir(config_dir: &Path) -> Result<Self> {
        Self::new(config_dir.join("rag.db")).await
    }

    // Chunk operations
    pub async fn count_chunks(&self) -> Result<i64> {
        ChunkQueries::count(&self.pool).await
    }

    pub async fn list_chunks(&self) -> Result<Vec<ChunkRecord>> {
        ChunkQueries::list_ordered(&self.pool).await
    }

    pub async fn insert_chunks(&self, records: &[NewChunkRecord]) -> Result<usize> {
        ChunkQueries::insert_batch(&self.pool, records).await
    }

    pub async fn source_summaries(&self) -> Result<Vec<SourceSummary>> {
        ChunkQueries::source_summaries(&self.pool).await
    }
}
