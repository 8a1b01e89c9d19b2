//! Drives one batch cycle end to end.
//!
//! Sequencing per item: download → detect text → detect images →
//! redact/upload/replace refs → aggregate → persist → commit → cleanup.
//! The unit of failure isolation is the single item: anything that goes
//! wrong after fetch/group is caught at one boundary, logged with the ad
//! id, and the batch moves on. Only a fetch/group failure aborts a cycle.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use admod_core::{Detection, Verdict};
use admod_db::repositories::AdRepo;
use admod_detectors::{ImageDetector, TextDetector};
use admod_storage::ObjectStore;
use sqlx::PgPool;

use crate::committer::StatusCommitter;
use crate::download::download_images;
use crate::error::PipelineError;
use crate::grouper::{group_candidates, AdCandidate};
use crate::persister::RunPersister;
use crate::uploader::{plan_uploads, stamp_object_keys, RedactionUploader};

/// Batch-level settings the orchestrator needs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Destination bucket for redacted images.
    pub client_bucket: String,
    /// Whether that bucket is world-readable; selects the URL form written
    /// back to ads.
    pub client_bucket_public: bool,
    /// Working directory for temp downloads, redacted outputs, and debug
    /// verdict files.
    pub work_dir: PathBuf,
    /// Upper bound on candidate rows per cycle.
    pub batch_limit: Option<i64>,
    /// When false, the audit trail is written but ad statuses are left
    /// untouched (dry run).
    pub commit_results: bool,
}

/// Counters logged at the end of each cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleStats {
    pub ads: usize,
    pub processed: usize,
    pub failed: usize,
}

/// Sequences moderation of one batch of paid ads.
///
/// All collaborators are injected at construction and owned for the
/// process lifetime; nothing here is lazily initialized.
pub struct BatchOrchestrator {
    pool: PgPool,
    store: ObjectStore,
    text_detector: Arc<dyn TextDetector>,
    image_detector: Arc<dyn ImageDetector>,
    http: reqwest::Client,
    cfg: PipelineConfig,
}

impl BatchOrchestrator {
    pub fn new(
        pool: PgPool,
        store: ObjectStore,
        text_detector: Arc<dyn TextDetector>,
        image_detector: Arc<dyn ImageDetector>,
        http: reqwest::Client,
        cfg: PipelineConfig,
    ) -> Self {
        Self {
            pool,
            store,
            text_detector,
            image_detector,
            http,
            cfg,
        }
    }

    /// Run one batch cycle over the current PAID backlog.
    ///
    /// Errors out only when the initial fetch fails; per-item errors are
    /// absorbed into [`CycleStats::failed`].
    pub async fn run_cycle(&self) -> Result<CycleStats, PipelineError> {
        let rows = AdRepo::fetch_paid(&self.pool, self.cfg.batch_limit).await?;
        let ads = group_candidates(rows);

        let mut stats = CycleStats {
            ads: ads.len(),
            ..Default::default()
        };
        tracing::info!(ads = stats.ads, "Batch cycle started");

        for ad in ads {
            let tmp_dir = self.cfg.work_dir.join("tmp").join(&ad.id);
            let result = self.moderate_ad(&ad, &tmp_dir).await;

            // Temp downloads are removed on success and failure alike.
            if let Err(e) = tokio::fs::remove_dir_all(&tmp_dir).await {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!(ad_id = %ad.id, path = %tmp_dir.display(), error = %e,
                        "Could not remove temp directory");
                }
            }

            match result {
                Ok(()) => stats.processed += 1,
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!(ad_id = %ad.id, error = %e,
                        "Ad moderation failed; continuing with next ad");
                }
            }
        }

        tracing::info!(
            ads = stats.ads,
            processed = stats.processed,
            failed = stats.failed,
            "Batch cycle finished"
        );
        Ok(stats)
    }

    /// Moderate one ad through every pipeline step.
    async fn moderate_ad(&self, ad: &AdCandidate, tmp_dir: &Path) -> Result<(), PipelineError> {
        let mut detections = Vec::new();

        let description = normalize_whitespace(&ad.description);
        if !description.is_empty() {
            detections
                .extend(detect_text_fail_open(self.text_detector.as_ref(), &ad.id, &description).await);
        }

        // Download what we can; missing images shrink the scan set.
        let local_paths = download_images(&self.http, &ad.id, &ad.image_urls, tmp_dir).await?;

        if !local_paths.is_empty() {
            let covered_dir = self.cfg.work_dir.join("images");
            detections.extend(
                detect_images_fail_open(
                    self.image_detector.as_ref(),
                    &ad.id,
                    &local_paths,
                    &covered_dir,
                )
                .await,
            );

            let jobs = plan_uploads(&ad.id, &detections);
            if !jobs.is_empty() {
                let uploader = RedactionUploader::new(
                    &self.store,
                    &self.cfg.client_bucket,
                    self.cfg.client_bucket_public,
                );
                let uploaded = uploader.run_uploads(&ad.id, &jobs).await;
                // Keys are recorded only for files that actually landed in
                // the store.
                stamp_object_keys(&mut detections, &uploaded);
                uploader
                    .replace_image_refs(&self.pool, &ad.id, &uploaded)
                    .await;
            }
        }

        let verdict = Verdict::from_detections(detections);
        RunPersister::persist(&self.pool, &ad.id, &verdict).await?;

        if self.cfg.commit_results {
            // The audit trail is already written; a commit failure leaves
            // the ad in PAID for the next run to pick up.
            if let Err(e) = StatusCommitter::commit(&self.pool, &ad.id, &verdict.detections).await {
                tracing::error!(ad_id = %ad.id, error = %e,
                    "Status commit failed; audit record kept");
            }
        }

        self.write_debug_verdict(&ad.id, &verdict).await;
        Ok(())
    }

    /// Operator-inspection artifact: one verdict JSON per ad in the work
    /// dir, overwritten on re-run. Not a durable interface; failures are
    /// only logged.
    async fn write_debug_verdict(&self, ad_id: &str, verdict: &Verdict) {
        let path = self.cfg.work_dir.join(format!("verdict_{ad_id}.json"));
        let payload = match serde_json::to_vec_pretty(verdict) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(ad_id, error = %e, "Could not serialize debug verdict");
                return;
            }
        };
        if let Err(e) = tokio::fs::write(&path, payload).await {
            tracing::warn!(ad_id, path = %path.display(), error = %e,
                "Could not write debug verdict");
        }
    }
}

/// Run the text detector fail-open: a broken classifier yields zero
/// detections for the item rather than a failed item.
async fn detect_text_fail_open(
    detector: &dyn TextDetector,
    ad_id: &str,
    description: &str,
) -> Vec<Detection> {
    match detector.detect(description).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(ad_id, error = %e,
                "Text detector failed; treating as no detections");
            Vec::new()
        }
    }
}

/// Image counterpart of [`detect_text_fail_open`].
async fn detect_images_fail_open(
    detector: &dyn ImageDetector,
    ad_id: &str,
    local_paths: &[PathBuf],
    covered_dir: &Path,
) -> Vec<Detection> {
    match detector.detect_and_redact(ad_id, local_paths, covered_dir).await {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(ad_id, error = %e,
                "Image detector failed; treating as no detections");
            Vec::new()
        }
    }
}

/// Collapse all whitespace runs to single spaces and trim.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use admod_detectors::DetectorError;
    use async_trait::async_trait;

    use super::*;

    struct BrokenTextDetector;

    #[async_trait]
    impl TextDetector for BrokenTextDetector {
        async fn detect(&self, _text: &str) -> Result<Vec<Detection>, DetectorError> {
            Err(DetectorError::InvalidResponse("classifier crashed".into()))
        }
    }

    struct FixedTextDetector(Vec<Detection>);

    #[async_trait]
    impl TextDetector for FixedTextDetector {
        async fn detect(&self, _text: &str) -> Result<Vec<Detection>, DetectorError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenImageDetector;

    #[async_trait]
    impl ImageDetector for BrokenImageDetector {
        async fn detect_and_redact(
            &self,
            _item_id: &str,
            _image_paths: &[PathBuf],
            _output_dir: &Path,
        ) -> Result<Vec<Detection>, DetectorError> {
            Err(DetectorError::InvalidResponse("sidecar crashed".into()))
        }
    }

    #[test]
    fn whitespace_normalization_collapses_runs() {
        assert_eq!(normalize_whitespace("  a\t b\n\nc "), "a b c");
        assert_eq!(normalize_whitespace("   "), "");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[tokio::test]
    async fn broken_text_detector_yields_zero_detections() {
        let found = detect_text_fail_open(&BrokenTextDetector, "A1", "some text").await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn working_text_detector_passes_findings_through() {
        let det = Detection::Text {
            category: "crypto".into(),
            score: Some(0.9),
            value: "биткоин".into(),
        };
        let found =
            detect_text_fail_open(&FixedTextDetector(vec![det.clone()]), "A1", "биткоин").await;
        assert_eq!(found, vec![det]);
    }

    #[tokio::test]
    async fn broken_image_detector_yields_zero_detections() {
        let found = detect_images_fail_open(
            &BrokenImageDetector,
            "A1",
            &[PathBuf::from("/tmp/a.jpg")],
            Path::new("/tmp/out"),
        )
        .await;
        assert!(found.is_empty());
    }
}
