//! Repository for the `moderation_detections` audit table.

use admod_core::types::DbId;
use admod_core::Detection;
use sqlx::PgPool;

/// Column list for INSERT (excludes auto-generated `id`).
const INSERT_COLUMNS: &str = "run_id, type, category, value, image_path, object_key";

/// Insert operations for per-run detection rows.
pub struct DetectionRepo;

impl DetectionRepo {
    /// Insert all detections of one run.
    ///
    /// Uses a single INSERT with multiple value rows. A no-op for an empty
    /// list (an acceptable item has a run row but no detection rows).
    pub async fn insert_many(
        pool: &PgPool,
        run_id: DbId,
        detections: &[Detection],
    ) -> Result<(), sqlx::Error> {
        if detections.is_empty() {
            return Ok(());
        }

        // Build a multi-row INSERT statement.
        let mut query = format!("INSERT INTO moderation_detections ({INSERT_COLUMNS}) VALUES ");
        let mut param_idx = 1u32;
        let mut first = true;

        for _ in detections {
            if !first {
                query.push_str(", ");
            }
            first = false;
            query.push('(');
            for i in 0..6 {
                if i > 0 {
                    query.push_str(", ");
                }
                query.push_str(&format!("${param_idx}"));
                param_idx += 1;
            }
            query.push(')');
        }

        let mut q = sqlx::query(&query);
        for det in detections {
            q = q.bind(run_id).bind(det.kind());
            q = match det {
                Detection::Text {
                    category, value, ..
                } => q
                    .bind(category)
                    .bind(Some(value.as_str()))
                    .bind(None::<&str>)
                    .bind(None::<&str>),
                Detection::Image {
                    category,
                    image,
                    object_key,
                    ..
                } => q
                    .bind(category)
                    .bind(None::<&str>)
                    .bind(Some(image.as_str()))
                    .bind(object_key.as_deref()),
            };
        }

        q.execute(pool).await?;
        Ok(())
    }
}
