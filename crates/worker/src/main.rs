//! Batch moderation worker.
//!
//! Wires the database pool, object store, and detector clients together,
//! then either runs a single batch cycle or repeats on a fixed interval
//! until interrupted. Interruption is honored between cycles only; a
//! cycle in flight always finishes its current item.

mod config;

use std::sync::Arc;
use std::time::Duration;

use admod_detectors::{
    DisabledImageDetector, HttpImageDetector, HttpTextDetector, ImageDetector,
    KeywordTextDetector, TextDetector,
};
use admod_pipeline::BatchOrchestrator;
use admod_storage::ObjectStore;
use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "admod_worker=debug,admod_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = WorkerConfig::from_env()?;

    if cfg.clean_work_dir_on_start {
        // Best effort; a fresh checkout has nothing to remove.
        let _ = tokio::fs::remove_dir_all(&cfg.work_dir).await;
    }
    tokio::fs::create_dir_all(&cfg.work_dir)
        .await
        .with_context(|| format!("cannot create work dir {}", cfg.work_dir.display()))?;

    let pool = admod_db::connect(&cfg.database_url)
        .await
        .context("database connection failed")?;
    admod_db::init_schema(&pool)
        .await
        .context("audit schema init failed")?;

    let store = ObjectStore::connect(&cfg.object_store).await;
    store
        .ensure_bucket(&cfg.system_bucket, false)
        .await
        .context("system bucket init failed")?;
    store
        .ensure_bucket(&cfg.client_bucket, cfg.client_bucket_public)
        .await
        .context("client bucket init failed")?;

    let http = reqwest::Client::new();

    let text_detector: Arc<dyn TextDetector> = match &cfg.text_detector_url {
        Some(url) => Arc::new(HttpTextDetector::new(
            http.clone(),
            url.clone(),
            cfg.text_threshold,
        )),
        None => {
            tracing::info!("TEXT_DETECTOR_URL not set; using keyword rules");
            Arc::new(KeywordTextDetector::new())
        }
    };

    let image_detector: Arc<dyn ImageDetector> = match &cfg.image_detector_url {
        Some(url) => Arc::new(HttpImageDetector::new(http.clone(), url.clone())),
        None => {
            tracing::warn!("IMAGE_DETECTOR_URL not set; image moderation disabled");
            Arc::new(DisabledImageDetector)
        }
    };

    let orchestrator = BatchOrchestrator::new(
        pool,
        store,
        text_detector,
        image_detector,
        http,
        cfg.pipeline(),
    );

    tracing::info!(
        commit_results = cfg.commit_results,
        batch_limit = ?cfg.batch_limit,
        interval_secs = ?cfg.run_interval_secs,
        "Moderation worker starting"
    );

    match cfg.run_interval_secs {
        None => {
            orchestrator
                .run_cycle()
                .await
                .context("batch cycle aborted")?;
        }
        Some(secs) => run_scheduled(&orchestrator, Duration::from_secs(secs)).await,
    }

    Ok(())
}

/// Repeat batch cycles on a fixed interval until Ctrl-C.
///
/// Cancellation is only observed between cycles; `run_cycle` itself is
/// never interrupted. A failed cycle (fetch error) is logged and the next
/// tick tries again.
async fn run_scheduled(orchestrator: &BatchOrchestrator, period: Duration) {
    let cancel = CancellationToken::new();

    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received; stopping after current cycle");
            signal_token.cancel();
        }
    });

    let mut interval = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Moderation worker stopping");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = orchestrator.run_cycle().await {
                    tracing::error!(error = %e, "Batch cycle aborted");
                }
            }
        }
    }
}
