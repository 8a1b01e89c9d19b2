//! Writes the immutable audit trail for one item: run, detection rows,
//! and the derived result summary.

use admod_core::types::DbId;
use admod_core::{ResultSummary, Verdict};
use admod_db::models::CreateResultSummary;
use admod_db::repositories::{DetectionRepo, ResultRepo, RunRepo};
use sqlx::PgPool;

use crate::error::PipelineError;

/// Persists one item's verdict as three appends: a `moderation_runs` row
/// (returning the generated run id), its `moderation_detections` rows, and
/// one `moderation_results` summary row.
pub struct RunPersister;

impl RunPersister {
    /// Write the full audit record for one item, returning the run id.
    ///
    /// A failure after the run row exists leaves a partial audit record;
    /// that is logged as a data-quality error (never rolled back or
    /// retried) and the error bubbles to the caller's item boundary.
    pub async fn persist(
        pool: &PgPool,
        ad_id: &str,
        verdict: &Verdict,
    ) -> Result<DbId, PipelineError> {
        let verdict_json = serde_json::to_value(verdict)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

        let run_id = RunRepo::insert(pool, verdict.acceptable, ad_id, &verdict_json).await?;

        if let Err(e) = DetectionRepo::insert_many(pool, run_id, &verdict.detections).await {
            tracing::error!(
                ad_id,
                run_id,
                error = %e,
                "Data quality: run saved but detection rows missing"
            );
            return Err(e.into());
        }

        let summary = ResultSummary::compute(&verdict.detections);
        let dto = CreateResultSummary::from_summary(ad_id, run_id, &summary);
        if let Err(e) = ResultRepo::insert(pool, &dto).await {
            tracing::error!(
                ad_id,
                run_id,
                error = %e,
                "Data quality: run saved but result summary missing"
            );
            return Err(e.into());
        }

        tracing::debug!(
            ad_id,
            run_id,
            acceptable = verdict.acceptable,
            detections = verdict.detections.len(),
            "Audit record persisted"
        );
        Ok(run_id)
    }
}
