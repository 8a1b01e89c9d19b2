//! Rows read from the upstream advertisement tables.

use sqlx::FromRow;

/// One row of the paid-candidate query: one row per (ad, image) pair.
///
/// Ads without image rows are never produced (the query inner-joins the
/// image table).
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    /// Upstream ad id, cast to text by the query.
    pub id: String,
    /// May be null or empty upstream.
    pub description: Option<String>,
    pub image_url: String,
}
