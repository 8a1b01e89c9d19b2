pub mod ad;
pub mod summary;

pub use ad::CandidateRow;
pub use summary::CreateResultSummary;
