//! Postgres access layer: connection pool, schema bootstrap, entity models
//! and repositories for the moderation audit tables and the upstream
//! advertisement tables.

pub mod models;
pub mod repositories;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Create a connection pool against the given database URL.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

/// Idempotent DDL for the three audit tables owned by this service.
///
/// The upstream `advertisement_auto` / `advertisement_images` tables belong
/// to the marketplace application and are never created here.
const SCHEMA_DDL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS moderation_runs (
        id BIGSERIAL PRIMARY KEY,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        acceptable BOOLEAN NOT NULL,
        source_id TEXT,
        verdict_json JSONB
    )",
    "CREATE TABLE IF NOT EXISTS moderation_detections (
        id BIGSERIAL PRIMARY KEY,
        run_id BIGINT NOT NULL REFERENCES moderation_runs(id) ON DELETE CASCADE,
        type TEXT,
        category TEXT,
        value TEXT,
        image_path TEXT,
        object_key TEXT
    )",
    "CREATE TABLE IF NOT EXISTS moderation_results (
        id BIGSERIAL PRIMARY KEY,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        ad_id TEXT NOT NULL,
        run_id BIGINT NOT NULL REFERENCES moderation_runs(id) ON DELETE CASCADE,
        acceptable BOOLEAN NOT NULL,
        text_acceptable BOOLEAN NOT NULL,
        image_acceptable BOOLEAN NOT NULL,
        total_detections INT NOT NULL DEFAULT 0,
        text_detections INT NOT NULL DEFAULT 0,
        image_detections INT NOT NULL DEFAULT 0,
        text_summary JSONB,
        image_summary JSONB
    )",
];

/// Ensure the audit tables exist. Safe to run on every startup.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for ddl in SCHEMA_DDL {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::debug!("Audit schema ensured");
    Ok(())
}
