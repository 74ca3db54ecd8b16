//! Metadata store trait and the SQLite implementation.

use crate::error::MetadataResult;
use crate::repos::RecordRepo;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: RecordRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    query_timeout: Duration,
}

impl SqliteStore {
    /// Create a new SQLite store, creating the database file if needed.
    pub async fn new(
        path: impl AsRef<Path>,
        query_timeout_secs: Option<u64>,
    ) -> MetadataResult<Self> {
        let path = path.as_ref();
        let query_timeout_secs = query_timeout_secs.unwrap_or(60);

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite allows one writer at a time.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self {
            pool,
            query_timeout: Duration::from_secs(query_timeout_secs),
        };
        store.migrate().await?;

        tracing::debug!(
            path = %path.display(),
            query_timeout_secs = query_timeout_secs,
            "SQLite metadata store opened"
        );

        Ok(store)
    }

    /// SQLite cannot cancel statements, so the configured timeout is only
    /// reported when exceeded.
    fn note_slow_query(&self, operation: &'static str, started: Instant) {
        let elapsed = started.elapsed();
        if elapsed > self.query_timeout {
            tracing::warn!(
                operation = operation,
                elapsed_ms = elapsed.as_millis() as u64,
                timeout_ms = self.query_timeout.as_millis() as u64,
                "SQLite query exceeded configured timeout"
            );
        }
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// SQLite has a limit of ~999 bound parameters per statement.
const BATCH_SIZE: usize = 900;

mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use time::OffsetDateTime;

    #[async_trait]
    impl RecordRepo for SqliteStore {
        async fn get_record(&self, schema_version: i32) -> MetadataResult<Option<RecordRow>> {
            let row = sqlx::query_as::<_, RecordRow>(
                "SELECT * FROM versioned_records WHERE schema_version = ?",
            )
            .bind(schema_version)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn get_record_summary(
            &self,
            schema_version: i32,
        ) -> MetadataResult<Option<RecordSummaryRow>> {
            let row = sqlx::query_as::<_, RecordSummaryRow>(
                r#"
                SELECT schema_version, version, length(content) AS content_size, updated_at
                FROM versioned_records
                WHERE schema_version = ?
                "#,
            )
            .bind(schema_version)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row)
        }

        async fn get_records_batch(
            &self,
            schema_versions: &[i32],
        ) -> MetadataResult<Vec<RecordRow>> {
            if schema_versions.is_empty() {
                return Ok(Vec::new());
            }

            let started = Instant::now();
            let mut result = Vec::with_capacity(schema_versions.len());

            for batch in schema_versions.chunks(BATCH_SIZE) {
                let placeholders: Vec<&str> = batch.iter().map(|_| "?").collect();
                let query = format!(
                    "SELECT * FROM versioned_records WHERE schema_version IN ({}) ORDER BY schema_version",
                    placeholders.join(", ")
                );

                let mut query_builder = sqlx::query_as::<_, RecordRow>(&query);
                for schema_version in batch {
                    query_builder = query_builder.bind(*schema_version);
                }

                result.extend(query_builder.fetch_all(&self.pool).await?);
            }

            self.note_slow_query("get_records_batch", started);
            Ok(result)
        }

        async fn apply_record_writes(&self, writes: &[RecordWrite]) -> MetadataResult<()> {
            if writes.is_empty() {
                return Ok(());
            }

            let started = Instant::now();
            let now = OffsetDateTime::now_utc();
            let mut tx = self.pool.begin().await?;

            for write in writes {
                tracing::debug!(
                    kind = write.kind.as_str(),
                    schema_version = write.schema_version,
                    version = %write.version,
                    "Staging record write"
                );
                // Keyed on schema_version alone, so a row created by a concurrent
                // update after planning is overwritten and the last commit wins.
                sqlx::query(
                    r#"
                    INSERT INTO versioned_records
                        (schema_version, version, content, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?)
                    ON CONFLICT(schema_version) DO UPDATE SET
                        version = excluded.version,
                        content = excluded.content,
                        updated_at = excluded.updated_at
                    "#,
                )
                .bind(write.schema_version)
                .bind(&write.version)
                .bind(&write.content)
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            self.note_slow_query("apply_record_writes", started);
            Ok(())
        }

        async fn list_record_summaries(&self) -> MetadataResult<Vec<RecordSummaryRow>> {
            let rows = sqlx::query_as::<_, RecordSummaryRow>(
                r#"
                SELECT schema_version, version, length(content) AS content_size, updated_at
                FROM versioned_records
                ORDER BY schema_version
                "#,
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        }
    }
}

/// SQLite schema (embedded).
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS versioned_records (
    schema_version INTEGER PRIMARY KEY CHECK (schema_version BETWEEN 1 AND 65536),
    version TEXT NOT NULL,
    content BLOB NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_versioned_records_version ON versioned_records(version);
"#;
