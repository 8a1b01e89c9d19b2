//! Detector capability seams and their implementations.
//!
//! The pipeline consumes content detection through two narrow traits so
//! that inference engines stay swappable: HTTP sidecar services in
//! production, keyword rules as the text fallback, and plain stubs in
//! tests. Detector instances are constructed once at process start and
//! passed by reference into the orchestrator.

pub mod image;
pub mod text;

use std::path::{Path, PathBuf};

use admod_core::Detection;
use async_trait::async_trait;

pub use image::{DisabledImageDetector, HttpImageDetector};
pub use text::{HttpTextDetector, KeywordTextDetector};

/// Errors from an underlying detection engine.
///
/// The orchestrator treats these fail-open: a broken classifier must never
/// block the batch from producing a verdict.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    /// The sidecar service was unreachable or returned a transport error.
    #[error("detector request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The sidecar answered with a non-success status.
    #[error("detector returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response payload could not be interpreted.
    #[error("detector response invalid: {0}")]
    InvalidResponse(String),

    /// Reading an input image or writing a redacted output failed.
    #[error("detector i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text classification capability.
#[async_trait]
pub trait TextDetector: Send + Sync {
    /// Classify one description, returning zero or more text detections.
    ///
    /// Callers pass non-empty, whitespace-normalized text only.
    async fn detect(&self, text: &str) -> Result<Vec<Detection>, DetectorError>;
}

/// Image object-detection + visual redaction capability.
#[async_trait]
pub trait ImageDetector: Send + Sync {
    /// Scan local images, writing redacted copies under
    /// `<output_dir>/<item_id>/` for every image with at least one finding.
    ///
    /// Each returned detection carries the source path; detections of a
    /// redacted image additionally carry the redacted file's path.
    async fn detect_and_redact(
        &self,
        item_id: &str,
        image_paths: &[PathBuf],
        output_dir: &Path,
    ) -> Result<Vec<Detection>, DetectorError>;
}
