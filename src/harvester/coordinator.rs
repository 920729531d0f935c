//! Harvest coordinator - run orchestration
//!
//! Owns everything a run needs and enforces its outer lifecycle:
//! - Generating the identifier plan from the configuration
//! - Starting the session pool (failing fast)
//! - Running the batch scheduler until done or interrupted
//! - Closing every session, whatever the outcome
//! - Writing the combined output files

use crate::config::Config;
use crate::harvester::fetcher::FetchContext;
use crate::harvester::scheduler::BatchScheduler;
use crate::identifier::{generate_identifiers, Identifier};
use crate::output::{CheckpointWriter, HarvestSummary};
use crate::session::{Session, SessionPool};
use crate::{HarvestError, SessionResult};
use chrono::Utc;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;

/// Main harvest coordinator structure
pub struct Coordinator {
    config: Config,
    client: Client,
    scheduler: BatchScheduler,
    identifiers: Vec<Identifier>,
}

impl Coordinator {
    /// Creates a coordinator for the given configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let client = build_http_client(&config)?;
        let identifiers = generate_identifiers(
            &config.harvest.years,
            config.harvest.max_sequence,
            &config.facilities,
        );

        let ctx = FetchContext::from_config(&config, client.clone());
        let writer = CheckpointWriter::new(&config.output.directory);
        let scheduler = BatchScheduler::new(ctx, config.harvest.batch_size, writer);

        tracing::info!("Generated {} student IDs", identifiers.len());

        Ok(Self {
            config,
            client,
            scheduler,
            identifiers,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared HTTP client, also usable by HTTP-backed sessions
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn identifiers(&self) -> &[Identifier] {
        &self.identifiers
    }

    /// Runs the harvest with sessions produced by `factory`
    ///
    /// Sessions are closed before this returns on every path that gets past
    /// pool startup: normal completion, a failed checkpoint, and `shutdown`
    /// resolving. The combined files are written only after all batches
    /// have completed.
    ///
    /// # Arguments
    ///
    /// * `factory` - Starts the session for a pool slot
    /// * `shutdown` - Resolves when the run should stop early
    ///
    /// # Returns
    ///
    /// * `Ok(HarvestSummary)` - Every batch ran and the final files are written
    /// * `Err(HarvestError::SessionInit)` - A session failed to start; nothing ran
    /// * `Err(HarvestError::Interrupted)` - `shutdown` resolved first
    /// * `Err(HarvestError::Checkpoint)` - Output could not be persisted
    pub async fn run<S, F, Fut>(
        &self,
        factory: F,
        shutdown: impl Future<Output = ()>,
    ) -> Result<HarvestSummary, HarvestError>
    where
        S: Session,
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = SessionResult<S>>,
    {
        let started_at = Utc::now();
        let pool = SessionPool::launch(self.config.harvest.workers, factory).await?;

        let outcome = tokio::select! {
            result = self.scheduler.run(&self.identifiers, &pool) => result,
            _ = shutdown => {
                tracing::warn!("Interrupted; stopping after closing sessions");
                Err(HarvestError::Interrupted)
            }
        };

        pool.release_all().await;

        let result = outcome?;
        self.scheduler
            .checkpoint_writer()
            .write_final(&result.records)
            .await?;

        let summary =
            HarvestSummary::from_run(&result, self.identifiers.len(), started_at, Utc::now());
        tracing::info!(
            "Scraped {} students successfully out of {} attempts",
            summary.succeeded,
            summary.attempted
        );

        Ok(summary)
    }
}

/// Builds the HTTP client used for image downloads and HTTP sessions
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.target.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}
