//! Repository for the `moderation_results` summary table.

use admod_core::types::DbId;
use sqlx::PgPool;

use crate::models::CreateResultSummary;

/// Insert operations for per-run result summaries.
pub struct ResultRepo;

impl ResultRepo {
    /// Insert one summary row and return its generated id.
    pub async fn insert(pool: &PgPool, summary: &CreateResultSummary) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO moderation_results ( \
                ad_id, run_id, acceptable, text_acceptable, image_acceptable, \
                total_detections, text_detections, image_detections, \
                text_summary, image_summary \
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING id",
        )
        .bind(&summary.ad_id)
        .bind(summary.run_id)
        .bind(summary.acceptable)
        .bind(summary.text_acceptable)
        .bind(summary.image_acceptable)
        .bind(summary.total_detections)
        .bind(summary.text_detections)
        .bind(summary.image_detections)
        .bind(&summary.text_summary)
        .bind(&summary.image_summary)
        .fetch_one(pool)
        .await
    }
}
