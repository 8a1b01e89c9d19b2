//! Pipeline error taxonomy.
//!
//! Every variant maps to one failure class of the batch: detector faults
//! are handled fail-open before they become a `PipelineError`; transfer,
//! persistence and commit faults bubble to the orchestrator's single
//! per-item boundary.

use admod_detectors::DetectorError;
use admod_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// An underlying detection engine failed.
    #[error("detector fault: {0}")]
    Detector(#[from] DetectorError),

    /// A download or object-store transfer failed.
    #[error("transfer fault: {0}")]
    Transfer(#[from] StorageError),

    /// An audit write failed.
    #[error("persistence fault: {0}")]
    Persistence(#[from] sqlx::Error),

    /// A local filesystem step (temp dir, downloaded file) failed.
    #[error("local file fault: {0}")]
    Io(#[from] std::io::Error),
}
