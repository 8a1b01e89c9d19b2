//! Redacted-image upload coordination.
//!
//! One source image can yield several box detections that all share one
//! redacted output file, so uploads are deduplicated by `output_path`
//! while every detection referencing an uploaded file gets stamped with
//! the resulting object key. Detections whose file never made it to the
//! store keep `object_key` unset; the persisted audit rows only ever
//! reference objects that exist.
//!
//! Planning and stamping are pure and separately testable;
//! [`RedactionUploader`] executes a plan against the object store and the
//! upstream image table.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use admod_core::Detection;
use admod_db::repositories::AdRepo;
use admod_storage::{internal_ref, ObjectStore};
use sqlx::PgPool;

/// One deduplicated upload: a local redacted file and its destination key.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadJob {
    pub output_path: String,
    pub object_key: String,
}

/// Object key for a redacted file: `images/covered/{ad_id}/{basename}`.
///
/// Derived from the basename alone so repeat sightings of the same
/// `output_path` recompute the identical key without re-uploading.
fn object_key_for(ad_id: &str, output_path: &str) -> String {
    let basename = Path::new(output_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| output_path.to_string());
    format!("images/covered/{ad_id}/{basename}")
}

/// Compute the deduplicated upload plan: one job per distinct
/// `output_path`, in first-sight order.
///
/// Detections without an `output_path` (text detections, image detections
/// whose source produced no redaction) contribute nothing.
pub fn plan_uploads(ad_id: &str, detections: &[Detection]) -> Vec<UploadJob> {
    let mut jobs: Vec<UploadJob> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for detection in detections {
        let Detection::Image {
            output_path: Some(output_path),
            ..
        } = detection
        else {
            continue;
        };

        if seen.insert(output_path) {
            jobs.push(UploadJob {
                output_path: output_path.clone(),
                object_key: object_key_for(ad_id, output_path),
            });
        }
    }

    jobs
}

/// Stamp `object_key` on every detection whose `output_path` was actually
/// uploaded.
///
/// Called after the uploads ran, with the jobs that succeeded: all
/// detections sharing one uploaded path get the same key regardless of
/// order, and detections of a failed upload stay unstamped.
pub fn stamp_object_keys(detections: &mut [Detection], uploaded: &[UploadJob]) {
    let keys_by_path: HashMap<&str, &str> = uploaded
        .iter()
        .map(|job| (job.output_path.as_str(), job.object_key.as_str()))
        .collect();

    for detection in detections.iter_mut() {
        let Detection::Image {
            output_path: Some(output_path),
            object_key,
            ..
        } = detection
        else {
            continue;
        };

        if let Some(key) = keys_by_path.get(output_path.as_str()) {
            *object_key = Some((*key).to_string());
        }
    }
}

/// Executes upload plans and replaces the ad's stored image references.
pub struct RedactionUploader<'a> {
    store: &'a ObjectStore,
    bucket: &'a str,
    /// Whether the destination bucket is world-readable; selects the URL
    /// form written back to ads.
    public_bucket: bool,
}

impl<'a> RedactionUploader<'a> {
    pub fn new(store: &'a ObjectStore, bucket: &'a str, public_bucket: bool) -> Self {
        Self {
            store,
            bucket,
            public_bucket,
        }
    }

    /// Upload every planned file once. A failed upload is logged and skips
    /// only that file; the remaining jobs still run. Returns the jobs that
    /// made it to the store, in plan order.
    pub async fn run_uploads(&self, ad_id: &str, jobs: &[UploadJob]) -> Vec<UploadJob> {
        let mut uploaded = Vec::with_capacity(jobs.len());
        for job in jobs {
            match self
                .store
                .upload_file(self.bucket, Path::new(&job.output_path), &job.object_key)
                .await
            {
                Ok(_) => uploaded.push(job.clone()),
                Err(e) => {
                    tracing::error!(
                        ad_id,
                        bucket = self.bucket,
                        key = %job.object_key,
                        path = %job.output_path,
                        error = %e,
                        "Redacted image upload failed; skipping this file"
                    );
                }
            }
        }
        uploaded
    }

    /// Replace the ad's stored image references with URLs for the uploaded
    /// keys.
    ///
    /// Skipped entirely when nothing was uploaded, preserving the original
    /// reference list. A replace failure is logged and swallowed here so
    /// verdict persistence still runs for the item.
    pub async fn replace_image_refs(&self, pool: &PgPool, ad_id: &str, uploaded: &[UploadJob]) {
        if uploaded.is_empty() {
            return;
        }

        let urls: Vec<String> = uploaded
            .iter()
            .map(|job| {
                if self.public_bucket {
                    self.store.object_url(self.bucket, &job.object_key)
                } else {
                    internal_ref(self.bucket, &job.object_key)
                }
            })
            .collect();

        match AdRepo::replace_image_urls(pool, ad_id, &urls).await {
            Ok(()) => {
                tracing::info!(ad_id, count = urls.len(), "Replaced ad image references");
            }
            Err(e) => {
                tracing::error!(
                    ad_id,
                    bucket = self.bucket,
                    error = %e,
                    "Failed to replace ad image references; keeping originals"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redacted_det(image: &str, output_path: &str) -> Detection {
        Detection::Image {
            category: "license_plate".into(),
            score: Some(0.8),
            image: image.into(),
            output_path: Some(output_path.into()),
            object_key: None,
        }
    }

    fn object_key(det: &Detection) -> Option<&str> {
        match det {
            Detection::Image { object_key, .. } => object_key.as_deref(),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn shared_output_path_plans_one_upload_and_stamps_all() {
        let mut detections = vec![
            redacted_det("/tmp/a.jpg", "/out/A1/covered_a.jpg"),
            redacted_det("/tmp/a.jpg", "/out/A1/covered_a.jpg"),
            redacted_det("/tmp/a.jpg", "/out/A1/covered_a.jpg"),
        ];

        let jobs = plan_uploads("A1", &detections);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].object_key, "images/covered/A1/covered_a.jpg");

        stamp_object_keys(&mut detections, &jobs);
        for det in &detections {
            assert_eq!(object_key(det), Some("images/covered/A1/covered_a.jpg"));
        }
    }

    #[test]
    fn distinct_output_paths_get_distinct_jobs_in_order() {
        let detections = vec![
            redacted_det("/tmp/b.jpg", "/out/A1/covered_b.jpg"),
            redacted_det("/tmp/a.jpg", "/out/A1/covered_a.jpg"),
            redacted_det("/tmp/b.jpg", "/out/A1/covered_b.jpg"),
        ];

        let jobs = plan_uploads("A1", &detections);

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].object_key, "images/covered/A1/covered_b.jpg");
        assert_eq!(jobs[1].object_key, "images/covered/A1/covered_a.jpg");
    }

    #[test]
    fn detections_without_redaction_are_untouched() {
        let mut detections = vec![
            Detection::Text {
                category: "crypto".into(),
                score: None,
                value: "биткоин".into(),
            },
            Detection::Image {
                category: "license_plate".into(),
                score: None,
                image: "/tmp/clean.jpg".into(),
                output_path: None,
                object_key: None,
            },
        ];

        let jobs = plan_uploads("A1", &detections);
        assert!(jobs.is_empty());

        stamp_object_keys(&mut detections, &jobs);
        assert_eq!(object_key(&detections[1]), None);
    }

    #[test]
    fn failed_upload_leaves_detections_unstamped() {
        let mut detections = vec![
            redacted_det("/tmp/a.jpg", "/out/A1/covered_a.jpg"),
            redacted_det("/tmp/a.jpg", "/out/A1/covered_a.jpg"),
        ];

        let jobs = plan_uploads("A1", &detections);
        assert_eq!(jobs.len(), 1);

        // Nothing made it to the store: the audit rows must not reference
        // an object that does not exist.
        stamp_object_keys(&mut detections, &[]);
        for det in &detections {
            assert_eq!(object_key(det), None);
        }
    }

    #[test]
    fn partial_upload_stamps_only_the_uploaded_path() {
        let mut detections = vec![
            redacted_det("/tmp/a.jpg", "/out/A1/covered_a.jpg"),
            redacted_det("/tmp/b.jpg", "/out/A1/covered_b.jpg"),
        ];

        let jobs = plan_uploads("A1", &detections);
        assert_eq!(jobs.len(), 2);

        // Only the first file uploaded successfully.
        stamp_object_keys(&mut detections, &jobs[..1]);
        assert_eq!(
            object_key(&detections[0]),
            Some("images/covered/A1/covered_a.jpg")
        );
        assert_eq!(object_key(&detections[1]), None);
    }

    #[test]
    fn single_redaction_scenario_plans_one_element_list() {
        // Two images, one detectable region: one redacted file, one upload.
        let detections = vec![redacted_det("/tmp/front.jpg", "/out/A2/covered_front.jpg")];

        let jobs = plan_uploads("A2", &detections);

        assert_eq!(jobs.len(), 1);
        assert_eq!(
            jobs[0],
            UploadJob {
                output_path: "/out/A2/covered_front.jpg".into(),
                object_key: "images/covered/A2/covered_front.jpg".into(),
            }
        );
    }
}
