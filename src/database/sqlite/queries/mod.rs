
use super::models::*;
use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::debug;

pub struct ChunkQueries;

impl ChunkQueries {
    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(pool)
            .await
            .context("Failed to count chunks")?;

        Ok(count)
    }

    /// All rows in insertion order
    #[inline]
    pub async fn list_ordered(pool: &SqlitePool) -> Result<Vec<ChunkRecord>> {
        let records = sqlx::query_as::<_, ChunkRecord>(
            r#"
            SELECT id,
                   source,
                   chunk_text,
                   embedding
            FROM chunks ORDER BY id ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .context("Failed to list chunks")?;

        Ok(records)
    }

    /// Insert every record in order inside one transaction
    #[inline]
    pub async fn insert_batch(pool: &SqlitePool, records: &[NewChunkRecord]) -> Result<usize> {
        let mut transaction = pool
            .begin()
            .await
            .context("Failed to begin transaction for chunk insert")?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO chunks (source, chunk_text, embedding)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(&record.source)
            .bind(&record.chunk_text)
            .bind(&record.embedding)
            .execute(&mut *transaction)
            .await
            .with_context(|| format!("Failed to insert chunk from {}", record.source))?;
        }

        transaction
            .commit()
            .await
            .context("Failed to commit chunk insert transaction")?;

        debug!("Inserted {} chunk records", records.len());

        Ok(records.len())
    }

    #[inline]
    pub async fn source_summaries(pool: &SqlitePool) -> Result<Vec<SourceSummary>> {
        let summaries = sqlx::query_as::<_, SourceSummary>(
            r#"
            SELECT source,
                   COUNT(*) AS chunk_count
            FROM chunks
            GROUP BY source
            ORDER BY source ASC
            "#,
        )
        .fetch_all(pool)
        .await
        .context("Failed to summarize chunk sources")?;

        Ok(summaries)
    }
}
