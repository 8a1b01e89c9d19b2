//! Domain types and pure moderation logic.
//!
//! Everything in this crate is side-effect free: the tagged detection
//! variant, verdict aggregation, the rejection predicate, and result
//! summary computation. Persistence and transport live in the `admod-db`,
//! `admod-storage` and `admod-pipeline` crates.

pub mod detection;
pub mod summary;
pub mod types;
pub mod verdict;

pub use detection::Detection;
pub use summary::ResultSummary;
pub use verdict::{should_reject, Verdict};
