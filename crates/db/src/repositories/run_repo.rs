//! Repository for the `moderation_runs` audit table.

use admod_core::types::DbId;
use sqlx::PgPool;

/// Insert operations for moderation runs. Runs are append-only.
pub struct RunRepo;

impl RunRepo {
    /// Insert one run row and return its generated id.
    pub async fn insert(
        pool: &PgPool,
        acceptable: bool,
        source_id: &str,
        verdict_json: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO moderation_runs (acceptable, source_id, verdict_json) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(acceptable)
        .bind(source_id)
        .bind(verdict_json)
        .fetch_one(pool)
        .await
    }
}
