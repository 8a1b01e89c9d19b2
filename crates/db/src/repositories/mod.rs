pub mod ad_repo;
pub mod detection_repo;
pub mod result_repo;
pub mod run_repo;

pub use ad_repo::AdRepo;
pub use detection_repo::DetectionRepo;
pub use result_repo::ResultRepo;
pub use run_repo::RunRepo;
