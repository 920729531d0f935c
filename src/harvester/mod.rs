//! Harvester module: the concurrent fetch pipeline
//!
//! This module contains the core harvesting logic, including:
//! - Field and profile image extraction from rendered pages
//! - Single-identifier fetching through a leased session
//! - Batch scheduling with per-batch checkpoints
//! - Overall run coordination and session teardown

mod asset;
mod coordinator;
mod extractor;
mod fetcher;
mod scheduler;

pub use asset::{asset_path, download_asset, AssetOutcome};
pub use coordinator::{build_http_client, Coordinator};
pub use extractor::{
    extract_record, find_asset_reference, find_asset_url, has_marker, MARKER_SELECTOR,
    PRIMARY_ROW_SELECTOR, SECONDARY_ROW_SELECTOR,
};
pub use fetcher::{fetch_record, FetchContext};
pub use scheduler::{BatchPhase, BatchReport, BatchScheduler, RunResult};

use crate::config::{Config, SessionEngine};
use crate::output::HarvestSummary;
use crate::HarvestError;
#[cfg(not(feature = "chrome"))]
use crate::ConfigError;

/// Runs a complete harvest, stopping early on Ctrl-C
///
/// Sessions are headless Chromium instances or plain HTTP sessions, as chosen
/// by `[target] engine`.
///
/// # Arguments
///
/// * `config` - The validated harvest configuration
///
/// # Returns
///
/// * `Ok(HarvestSummary)` - All batches ran and the final files are written
/// * `Err(HarvestError)` - Startup failed, output failed, or the run was interrupted
///
/// # Example
///
/// ```no_run
/// use roster_harvest::config::default_config;
/// use roster_harvest::harvester::harvest;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = harvest(default_config()?).await?;
/// println!("{} records", summary.succeeded);
/// # Ok(())
/// # }
/// ```
pub async fn harvest(config: Config) -> Result<HarvestSummary, HarvestError> {
    let coordinator = Coordinator::new(config)?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let engine = coordinator.config().target.engine;
    tracing::info!("Rendering pages with the {:?} engine", engine);

    match engine {
        #[cfg(feature = "chrome")]
        SessionEngine::Chrome => {
            use crate::session::ChromeSession;
            coordinator
                .run(|_| ChromeSession::launch(), shutdown)
                .await
        }

        #[cfg(not(feature = "chrome"))]
        SessionEngine::Chrome => Err(HarvestError::Config(ConfigError::Validation(
            "engine 'chrome' requires a build with the `chrome` feature".to_string(),
        ))),

        SessionEngine::Http => {
            use crate::session::HttpSession;
            let client = coordinator.client().clone();
            coordinator
                .run(
                    move |_| {
                        let session = HttpSession::new(client.clone());
                        async move { Ok(session) }
                    },
                    shutdown,
                )
                .await
        }
    }
}
