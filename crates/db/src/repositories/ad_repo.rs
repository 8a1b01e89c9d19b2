//! Repository for the upstream `advertisement_auto` / `advertisement_images`
//! tables.
//!
//! This is the only repository that mutates upstream state, and it does so
//! in exactly two ways: the guarded status transition and the image
//! reference replace. Everything else is read-only.

use sqlx::PgPool;

use crate::models::CandidateRow;

/// Provides candidate fetch and lifecycle mutations for advertisements.
pub struct AdRepo;

impl AdRepo {
    /// Fetch paid ads awaiting moderation, one row per (ad, image) pair.
    ///
    /// Rows are ordered by ad creation time ascending so older ads are
    /// processed first. `limit` bounds the row count, not the ad count.
    pub async fn fetch_paid(
        pool: &PgPool,
        limit: Option<i64>,
    ) -> Result<Vec<CandidateRow>, sqlx::Error> {
        let base = "SELECT au.id::text AS id, au.description, ai.image_url \
             FROM advertisement_auto au \
             INNER JOIN advertisement_images ai ON au.id = ai.advertisement_id \
             WHERE au.status = 'PAID' \
             ORDER BY au.created_at ASC";

        match limit {
            Some(limit) => {
                let query = format!("{base} LIMIT $1");
                sqlx::query_as::<_, CandidateRow>(&query)
                    .bind(limit)
                    .fetch_all(pool)
                    .await
            }
            None => sqlx::query_as::<_, CandidateRow>(base).fetch_all(pool).await,
        }
    }

    /// Transition an ad `PAID -> MODERATED`, stamping `moderated_at`.
    ///
    /// The `status = 'PAID'` guard makes the commit idempotent: an ad
    /// already moved out of PAID (by a previous or concurrent run) is left
    /// untouched. Returns the number of affected rows (0 or 1).
    pub async fn mark_moderated(pool: &PgPool, ad_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE advertisement_auto \
             SET status = 'MODERATED', moderated_at = NOW() \
             WHERE id::text = $1 AND status = 'PAID'",
        )
        .bind(ad_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Transition an ad `PAID -> REJECTED`, stamping `moderated_at`.
    ///
    /// Same guard semantics as [`mark_moderated`](Self::mark_moderated).
    pub async fn mark_rejected(pool: &PgPool, ad_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE advertisement_auto \
             SET status = 'REJECTED', moderated_at = NOW() \
             WHERE id::text = $1 AND status = 'PAID'",
        )
        .bind(ad_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Replace an ad's stored image references with the given URL list.
    ///
    /// Full replace, not append: the existing rows are deleted and the new
    /// ones inserted inside one transaction so readers never observe a
    /// partial list. Callers must skip this entirely when `urls` is empty
    /// (an ad with no redactions keeps its original images).
    pub async fn replace_image_urls(
        pool: &PgPool,
        ad_id: &str,
        urls: &[String],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM advertisement_images WHERE advertisement_id::text = $1")
            .bind(ad_id)
            .execute(&mut *tx)
            .await?;

        for url in urls {
            sqlx::query(
                "INSERT INTO advertisement_images (advertisement_id, image_url) \
                 SELECT id, $2 FROM advertisement_auto WHERE id::text = $1",
            )
            .bind(ad_id)
            .bind(url)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await
    }
}
