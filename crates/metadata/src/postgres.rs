//! PostgreSQL-based metadata store implementation.

use crate::error::MetadataResult;
use crate::models::*;
use crate::repos::RecordRepo;
use crate::store::MetadataStore;
use async_trait::async_trait;
use larder_core::config::PgSslMode;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode as SqlxPgSslMode};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use time::OffsetDateTime;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

fn postgres_schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// PostgreSQL-based metadata store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Create a new PostgreSQL store from individual connection parameters.
    ///
    /// This allows credentials to be passed separately, e.g. the password
    /// through an environment variable.
    #[allow(clippy::too_many_arguments)]
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        ssl_mode: Option<PgSslMode>,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }

        if let Some(pass) = password {
            opts = opts.password(pass);
        }

        if let Some(mode) = ssl_mode {
            let sqlx_mode = match mode {
                PgSslMode::Disable => SqlxPgSslMode::Disable,
                PgSslMode::Prefer => SqlxPgSslMode::Prefer,
                PgSslMode::Require => SqlxPgSslMode::Require,
            };
            opts = opts.ssl_mode(sqlx_mode);
        }

        // Log connection info without password
        tracing::info!(
            host = host,
            port = port,
            database = database,
            username = username.unwrap_or("<none>"),
            ssl_mode = ?ssl_mode,
            "Connecting to PostgreSQL with individual parameters"
        );

        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    async fn connect(
        mut opts: PgConnectOptions,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        if let Some(timeout_ms) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{}ms", timeout_ms))]);
            tracing::info!("PostgreSQL statement_timeout set to {}ms", timeout_ms);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }
}

#[async_trait]
impl MetadataStore for PostgresStore {
    async fn migrate(&self) -> MetadataResult<()> {
        // PostgreSQL doesn't allow multiple statements in a single prepared statement,
        // so we split the schema and execute each statement separately.
        for statement in postgres_schema_statements(POSTGRES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordRepo for PostgresStore {
    async fn get_record(&self, schema_version: i32) -> MetadataResult<Option<RecordRow>> {
        let row = sqlx::query_as::<_, RecordRow>(
            "SELECT * FROM versioned_records WHERE schema_version = $1",
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
            SELECT schema_version, version, octet_length(content)::BIGINT AS content_size, updated_at
            FROM versioned_records
            WHERE schema_version = $1
            "#,
        )
        .bind(schema_version)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_records_batch(&self, schema_versions: &[i32]) -> MetadataResult<Vec<RecordRow>> {
        if schema_versions.is_empty() {
            return Ok(Vec::new());
        }

        // PostgreSQL supports ANY($1) with an array parameter, so no batching is needed
        let rows = sqlx::query_as::<_, RecordRow>(
            "SELECT * FROM versioned_records WHERE schema_version = ANY($1) ORDER BY schema_version",
        )
        .bind(schema_versions)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn apply_record_writes(&self, writes: &[RecordWrite]) -> MetadataResult<()> {
        if writes.is_empty() {
            return Ok(());
        }

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
                VALUES ($1, $2, $3, $4, $4)
                ON CONFLICT (schema_version) DO UPDATE SET
                    version = EXCLUDED.version,
                    content = EXCLUDED.content,
                    updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(write.schema_version)
            .bind(&write.version)
            .bind(&write.content)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_record_summaries(&self) -> MetadataResult<Vec<RecordSummaryRow>> {
        let rows = sqlx::query_as::<_, RecordSummaryRow>(
            r#"
            SELECT schema_version, version, octet_length(content)::BIGINT AS content_size, updated_at
            FROM versioned_records
            ORDER BY schema_version
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
