//! Terminal lifecycle transition for a moderated ad.

use admod_core::{should_reject, Detection};
use admod_db::repositories::AdRepo;
use sqlx::PgPool;

/// Status an item was committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    Moderated,
    Rejected,
}

impl CommitStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CommitStatus::Moderated => "MODERATED",
            CommitStatus::Rejected => "REJECTED",
        }
    }
}

/// Outcome of one commit attempt.
#[derive(Debug, Clone, Copy)]
pub struct CommitOutcome {
    pub status: CommitStatus,
    /// Rows affected by the guarded UPDATE. Zero means the ad had already
    /// left PAID, which is a normal outcome.
    pub rows_affected: u64,
}

/// Applies the `PAID -> MODERATED | REJECTED` transition.
pub struct StatusCommitter;

impl StatusCommitter {
    /// Commit the item's terminal status based on its detections.
    ///
    /// Text findings reject the ad outright; image-only findings are
    /// already handled by redaction, so the ad is moderated. The
    /// `WHERE status = 'PAID'` guard in the repository makes repeated
    /// commits idempotent.
    pub async fn commit(
        pool: &PgPool,
        ad_id: &str,
        detections: &[Detection],
    ) -> Result<CommitOutcome, sqlx::Error> {
        let (status, rows_affected) = if should_reject(detections) {
            (
                CommitStatus::Rejected,
                AdRepo::mark_rejected(pool, ad_id).await?,
            )
        } else {
            (
                CommitStatus::Moderated,
                AdRepo::mark_moderated(pool, ad_id).await?,
            )
        };

        if rows_affected > 0 {
            tracing::info!(ad_id, status = status.as_str(), rows_affected, "Ad status committed");
        } else {
            tracing::info!(
                ad_id,
                status = status.as_str(),
                "No rows updated; ad likely no longer in PAID"
            );
        }

        Ok(CommitOutcome {
            status,
            rows_affected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_match_upstream_lifecycle_values() {
        assert_eq!(CommitStatus::Moderated.as_str(), "MODERATED");
        assert_eq!(CommitStatus::Rejected.as_str(), "REJECTED");
    }
}
