//! Image detectors: the HTTP detect-and-redact client and a disabled stub.

use std::path::{Path, PathBuf};

use admod_core::Detection;
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;

use crate::{DetectorError, ImageDetector};

/// One detected region in the sidecar response. Box coordinates stay on
/// the sidecar side; the pipeline only needs the label and the redacted
/// rendering.
#[derive(Debug, Deserialize)]
struct ImageFinding {
    category: String,
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    detections: Vec<ImageFinding>,
    /// Base64-encoded redacted copy, present when at least one region was
    /// drawn over.
    redacted_b64: Option<String>,
}

/// Client for an object-detection sidecar that also renders redactions.
///
/// Uploads each image via multipart POST and writes the returned redacted
/// copy as `covered_<basename>` under `<output_dir>/<item_id>/`. All
/// detections of one image share that single redacted output.
pub struct HttpImageDetector {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpImageDetector {
    pub fn new(http: reqwest::Client, endpoint: String) -> Self {
        Self { http, endpoint }
    }

    async fn scan_one(
        &self,
        item_id: &str,
        image_path: &Path,
        output_dir: &Path,
    ) -> Result<Vec<Detection>, DetectorError> {
        let bytes = tokio::fs::read(image_path).await?;
        let basename = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        let form = reqwest::multipart::Form::new()
            .text("item_id", item_id.to_string())
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(basename.clone()),
            );

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DetectorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ImageResponse = response
            .json()
            .await
            .map_err(|e| DetectorError::InvalidResponse(e.to_string()))?;

        if parsed.detections.is_empty() {
            return Ok(Vec::new());
        }

        // Write the redacted copy once; every detection of this image
        // points at it.
        let output_path = match parsed.redacted_b64 {
            Some(encoded) => {
                let redacted = base64::engine::general_purpose::STANDARD
                    .decode(encoded)
                    .map_err(|e| {
                        DetectorError::InvalidResponse(format!("bad redacted payload: {e}"))
                    })?;
                let target_dir = output_dir.join(item_id);
                tokio::fs::create_dir_all(&target_dir).await?;
                let path = target_dir.join(format!("covered_{basename}"));
                tokio::fs::write(&path, redacted).await?;
                Some(path.to_string_lossy().into_owned())
            }
            None => None,
        };

        let source = image_path.to_string_lossy().into_owned();
        Ok(parsed
            .detections
            .into_iter()
            .map(|finding| Detection::Image {
                category: finding.category,
                score: finding.score,
                image: source.clone(),
                output_path: output_path.clone(),
                object_key: None,
            })
            .collect())
    }
}

#[async_trait]
impl ImageDetector for HttpImageDetector {
    async fn detect_and_redact(
        &self,
        item_id: &str,
        image_paths: &[PathBuf],
        output_dir: &Path,
    ) -> Result<Vec<Detection>, DetectorError> {
        let mut detections = Vec::new();
        for path in image_paths {
            // A missing file or failed scan reduces the scanned set; the
            // rest of the item's images are still processed and earlier
            // findings are kept.
            if !path.is_file() {
                tracing::warn!(item_id, path = %path.display(), "Skipping missing image");
                continue;
            }
            match self.scan_one(item_id, path, output_dir).await {
                Ok(found) => detections.extend(found),
                Err(e) => {
                    tracing::warn!(item_id, path = %path.display(), error = %e,
                        "Image scan failed; skipping this image");
                }
            }
        }
        Ok(detections)
    }
}

/// Stand-in used when no image sidecar is configured: scans nothing,
/// reports nothing, lets the rest of the pipeline run.
pub struct DisabledImageDetector;

#[async_trait]
impl ImageDetector for DisabledImageDetector {
    async fn detect_and_redact(
        &self,
        item_id: &str,
        image_paths: &[PathBuf],
        _output_dir: &Path,
    ) -> Result<Vec<Detection>, DetectorError> {
        tracing::debug!(
            item_id,
            images = image_paths.len(),
            "Image detection disabled; skipping"
        );
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_detector_reports_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let detections = DisabledImageDetector
            .detect_and_redact("A1", &[tmp.path().join("car.jpg")], tmp.path())
            .await
            .unwrap();
        assert!(detections.is_empty());
    }

    #[tokio::test]
    async fn unreachable_sidecar_skips_images_instead_of_failing() {
        let tmp = tempfile::tempdir().unwrap();
        let first = tmp.path().join("car.jpg");
        let second = tmp.path().join("house.jpg");
        tokio::fs::write(&first, b"jpeg bytes").await.unwrap();
        tokio::fs::write(&second, b"jpeg bytes").await.unwrap();

        // Port 1 refuses connections, so every scan errors; the item still
        // gets a clean empty result rather than an aborted run.
        let detector = HttpImageDetector::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1/detect".to_string(),
        );
        let detections = detector
            .detect_and_redact("A1", &[first, second], tmp.path())
            .await
            .unwrap();
        assert!(detections.is_empty());
    }
}
