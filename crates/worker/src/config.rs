//! Worker configuration loaded from environment variables.

use std::path::PathBuf;

use admod_pipeline::PipelineConfig;
use admod_storage::ObjectStoreConfig;
use anyhow::Context;

/// Full configuration for one worker process.
///
/// | Env Var                  | Default      | Notes                          |
/// |--------------------------|--------------|--------------------------------|
/// | `DATABASE_URL`           | required     | Postgres connection string     |
/// | `S3_ENDPOINT`            | required     | e.g. `http://minio:9000`       |
/// | `S3_ACCESS_KEY`          | required     |                                |
/// | `S3_SECRET_KEY`          | required     |                                |
/// | `SYSTEM_BUCKET`          | required     | private, internal artifacts    |
/// | `CLIENT_BUCKET`          | required     | redacted images land here      |
/// | `CLIENT_BUCKET_PUBLIC`   | `false`      | world-readable client bucket   |
/// | `BATCH_LIMIT`            | `50`         | `0` disables the limit         |
/// | `COMMIT_RESULTS`         | `false`      | dry run when unset             |
/// | `WORK_DIR`               | `./output`   |                                |
/// | `CLEAN_WORK_DIR_ON_START`| `false`      |                                |
/// | `RUN_INTERVAL_SECS`      | unset        | unset = run one cycle and exit |
/// | `TEXT_DETECTOR_URL`      | unset        | unset = keyword rules          |
/// | `IMAGE_DETECTOR_URL`     | unset        | unset = image scan disabled    |
/// | `TEXT_THRESHOLD`         | `0.6`        | classifier score cut-off       |
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub object_store: ObjectStoreConfig,
    pub system_bucket: String,
    pub client_bucket: String,
    pub client_bucket_public: bool,
    pub batch_limit: Option<i64>,
    pub commit_results: bool,
    pub work_dir: PathBuf,
    pub clean_work_dir_on_start: bool,
    pub run_interval_secs: Option<u64>,
    pub text_detector_url: Option<String>,
    pub image_detector_url: Option<String>,
    pub text_threshold: f64,
}

impl WorkerConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let batch_limit: i64 = std::env::var("BATCH_LIMIT")
            .unwrap_or_else(|_| "50".into())
            .parse()
            .context("BATCH_LIMIT must be an integer")?;

        let text_threshold: f64 = std::env::var("TEXT_THRESHOLD")
            .unwrap_or_else(|_| admod_detectors::text::DEFAULT_THRESHOLD.to_string())
            .parse()
            .context("TEXT_THRESHOLD must be a number")?;

        let run_interval_secs = match std::env::var("RUN_INTERVAL_SECS") {
            Ok(value) => Some(
                value
                    .parse::<u64>()
                    .context("RUN_INTERVAL_SECS must be a positive integer")?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            object_store: ObjectStoreConfig {
                endpoint: required("S3_ENDPOINT")?,
                access_key: required("S3_ACCESS_KEY")?,
                secret_key: required("S3_SECRET_KEY")?,
            },
            system_bucket: required("SYSTEM_BUCKET")?,
            client_bucket: required("CLIENT_BUCKET")?,
            client_bucket_public: bool_var("CLIENT_BUCKET_PUBLIC"),
            batch_limit: (batch_limit > 0).then_some(batch_limit),
            commit_results: bool_var("COMMIT_RESULTS"),
            work_dir: PathBuf::from(
                std::env::var("WORK_DIR").unwrap_or_else(|_| "./output".into()),
            ),
            clean_work_dir_on_start: bool_var("CLEAN_WORK_DIR_ON_START"),
            run_interval_secs,
            text_detector_url: optional("TEXT_DETECTOR_URL"),
            image_detector_url: optional("IMAGE_DETECTOR_URL"),
            text_threshold,
        })
    }

    /// The subset the orchestrator needs.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            client_bucket: self.client_bucket.clone(),
            client_bucket_public: self.client_bucket_public,
            work_dir: self.work_dir.clone(),
            batch_limit: self.batch_limit,
            commit_results: self.commit_results,
        }
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name).with_context(|| format!("missing required env var: {name}"))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Truthy values: `1`, `true`, `yes`, `y`, `on` (case-insensitive).
fn bool_var(name: &str) -> bool {
    std::env::var(name)
        .map(|value| parse_bool(&value))
        .unwrap_or(false)
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_spellings_parse_true() {
        for value in ["1", "true", "TRUE", "yes", "Y", "on", " on "] {
            assert!(parse_bool(value), "{value:?} should be truthy");
        }
    }

    #[test]
    fn everything_else_parses_false() {
        for value in ["0", "false", "no", "off", "", "enabled"] {
            assert!(!parse_bool(value), "{value:?} should be falsy");
        }
    }
}
