//! Batch moderation pipeline: candidate grouping, image download,
//! redaction upload coordination, audit persistence, status commit, and
//! the per-cycle orchestrator that ties them together with per-item
//! failure isolation.

pub mod committer;
pub mod download;
pub mod error;
pub mod grouper;
pub mod orchestrator;
pub mod persister;
pub mod uploader;

pub use error::PipelineError;
pub use grouper::{group_candidates, AdCandidate};
pub use orchestrator::{BatchOrchestrator, CycleStats, PipelineConfig};
