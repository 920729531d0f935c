//! Single-identifier fetch
//!
//! Drives one leased session through a record page: navigate, wait for the
//! record table to render, extract fields, and fetch the profile image.

use crate::config::Config;
use crate::harvester::asset::{asset_path, download_asset};
use crate::harvester::extractor::{extract_record, find_asset_url, has_marker};
use crate::identifier::Identifier;
use crate::record::{Record, IMAGE_PATH_FIELD};
use crate::session::Session;
use crate::{FetchError, SessionResult};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Everything a fetch needs besides the session
#[derive(Debug, Clone)]
pub struct FetchContext {
    /// Client for image downloads
    pub client: Client,

    /// Page URL with an `{id}` placeholder
    pub url_template: String,

    /// Upper bound on waiting for the record table
    pub marker_timeout: Duration,

    /// Delay between content checks while waiting
    pub poll_interval: Duration,

    /// Where profile images are stored
    pub image_dir: PathBuf,
}

impl FetchContext {
    pub fn from_config(config: &Config, client: Client) -> Self {
        Self {
            client,
            url_template: config.target.url_template.clone(),
            marker_timeout: Duration::from_millis(config.harvest.marker_timeout_ms),
            poll_interval: Duration::from_millis(config.harvest.poll_interval_ms),
            image_dir: Path::new(&config.output.directory).join(&config.output.image_directory),
        }
    }

    /// Record page URL for an identifier
    pub fn target_url(&self, identifier: &Identifier) -> String {
        self.url_template.replace("{id}", &identifier.to_string())
    }
}

/// Result of waiting for the record table
enum MarkerWait {
    Found(String),
    TimedOut(String),
}

/// Fetches and extracts one identifier's record
///
/// # Flow
///
/// 1. Navigate the session to the identifier's page
/// 2. Poll the content until the record table appears or the timeout passes;
///    a timeout is logged and the latest content is used anyway
/// 3. Extract two-cell rows into a [`Record`]
/// 4. Reject records with nothing but the identifier as [`FetchError::NoData`]
/// 5. Download the profile image if one is referenced; image failures are
///    logged and never fail the fetch
///
/// # Returns
///
/// * `Ok(Record)` - At least one field was extracted
/// * `Err(FetchError::NoData)` - The page held no fields
/// * `Err(FetchError::Unexpected)` - The session failed
pub async fn fetch_record<S: Session + ?Sized>(
    identifier: &Identifier,
    session: &mut S,
    ctx: &FetchContext,
) -> Result<Record, FetchError> {
    let id = identifier.to_string();
    let url = ctx.target_url(identifier);

    let unexpected = |source| FetchError::Unexpected {
        identifier: id.clone(),
        source,
    };

    session.navigate(&url).await.map_err(unexpected)?;

    let html = match wait_for_marker(session, ctx.marker_timeout, ctx.poll_interval)
        .await
        .map_err(unexpected)?
    {
        MarkerWait::Found(html) => html,
        MarkerWait::TimedOut(html) => {
            tracing::warn!("Timeout waiting for data for student ID: {}", id);
            html
        }
    };

    let mut record = extract_record(&html, identifier);
    if !record.has_data() {
        return Err(FetchError::NoData { identifier: id });
    }

    match Url::parse(&url) {
        Ok(page_url) => attach_asset(&mut record, &html, &page_url, &id, ctx).await,
        Err(e) => tracing::warn!("Cannot resolve image for {}: bad page URL {}: {}", id, url, e),
    }

    Ok(record)
}

/// Polls session content until the marker is present or `timeout` elapses
async fn wait_for_marker<S: Session + ?Sized>(
    session: &mut S,
    timeout: Duration,
    poll_interval: Duration,
) -> SessionResult<MarkerWait> {
    let deadline = Instant::now() + timeout;

    loop {
        let html = session.content().await?;
        if has_marker(&html) {
            return Ok(MarkerWait::Found(html));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(MarkerWait::TimedOut(html));
        }

        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}

async fn attach_asset(
    record: &mut Record,
    html: &str,
    page_url: &Url,
    id: &str,
    ctx: &FetchContext,
) {
    let Some(asset_url) = find_asset_url(html, page_url) else {
        tracing::debug!("No profile image found for student ID: {}", id);
        return;
    };

    let path = asset_path(&ctx.image_dir, id);
    match download_asset(&ctx.client, asset_url.as_str(), &path).await {
        Ok(outcome) => {
            record.insert(IMAGE_PATH_FIELD, outcome.path().display().to_string());
        }
        Err(e) => {
            tracing::warn!("Failed to download image for student ID {}: {}", id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SessionError, SessionResult};
    use async_trait::async_trait;

    /// Serves a fixed page, optionally only after a number of polls
    struct ScriptedSession {
        html: String,
        ready_after: usize,
        polls: usize,
        navigated: Option<String>,
        fail_navigation: bool,
    }

    impl ScriptedSession {
        fn new(html: &str) -> Self {
            Self {
                html: html.to_string(),
                ready_after: 0,
                polls: 0,
                navigated: None,
                fail_navigation: false,
            }
        }
    }

    #[async_trait]
    impl Session for ScriptedSession {
        async fn navigate(&mut self, url: &str) -> SessionResult<()> {
            if self.fail_navigation {
                return Err(SessionError::Navigation {
                    url: url.to_string(),
                    message: "connection reset".to_string(),
                });
            }
            self.navigated = Some(url.to_string());
            self.polls = 0;
            Ok(())
        }

        async fn content(&mut self) -> SessionResult<String> {
            self.polls += 1;
            if self.polls > self.ready_after {
                Ok(self.html.clone())
            } else {
                Ok("<div>Loading</div>".to_string())
            }
        }

        async fn close(&mut self) -> SessionResult<()> {
            Ok(())
        }
    }

    fn context(image_dir: &Path) -> FetchContext {
        FetchContext {
            client: Client::new(),
            url_template: "https://h/qr?student_id={id}".to_string(),
            marker_timeout: Duration::from_millis(200),
            poll_interval: Duration::from_millis(10),
            image_dir: image_dir.to_path_buf(),
        }
    }

    const PAGE: &str = r#"<table class="key-value-table"><tr><td>Name</td><td>Dara</td></tr></table>"#;

    #[test]
    fn test_target_url() {
        let ctx = context(Path::new("images"));
        let id = Identifier::new("22", "01", "01", 5);
        assert_eq!(ctx.target_url(&id), "https://h/qr?student_id=220101005");
    }

    #[tokio::test]
    async fn test_fetch_success_without_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ScriptedSession::new(PAGE);
        let id = Identifier::new("22", "01", "01", 1);

        let record = fetch_record(&id, &mut session, &context(dir.path()))
            .await
            .unwrap();

        assert_eq!(record.get("Name"), Some("Dara"));
        assert_eq!(record.image_path(), None);
        assert_eq!(
            session.navigated.as_deref(),
            Some("https://h/qr?student_id=220101001")
        );
    }

    #[tokio::test]
    async fn test_waits_for_late_render() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ScriptedSession::new(PAGE);
        session.ready_after = 3;
        let id = Identifier::new("22", "01", "01", 1);

        let record = fetch_record(&id, &mut session, &context(dir.path()))
            .await
            .unwrap();

        assert_eq!(record.get("Name"), Some("Dara"));
        assert_eq!(session.polls, 4);
    }

    #[tokio::test]
    async fn test_timeout_proceeds_and_reports_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ScriptedSession::new(PAGE);
        session.ready_after = usize::MAX;
        let id = Identifier::new("22", "01", "01", 1);

        let result = fetch_record(&id, &mut session, &context(dir.path())).await;

        assert!(matches!(result, Err(FetchError::NoData { .. })));
        assert!(session.polls > 1);
    }

    #[tokio::test]
    async fn test_navigation_failure_is_unexpected() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ScriptedSession::new(PAGE);
        session.fail_navigation = true;
        let id = Identifier::new("22", "01", "01", 1);

        let result = fetch_record(&id, &mut session, &context(dir.path())).await;

        assert!(matches!(result, Err(FetchError::Unexpected { .. })));
    }

    #[tokio::test]
    async fn test_existing_image_is_attached_without_request() {
        let dir = tempfile::tempdir().unwrap();
        let id = Identifier::new("22", "01", "01", 1);
        let existing = asset_path(dir.path(), "220101001");
        std::fs::write(&existing, b"jpeg").unwrap();

        // The image host does not exist; only the on-disk copy can satisfy this
        let html = format!(
            r#"{}<div style="background-image: url('https://127.0.0.1:1/x.jpg')"></div>"#,
            PAGE
        );
        let mut session = ScriptedSession::new(&html);

        let record = fetch_record(&id, &mut session, &context(dir.path()))
            .await
            .unwrap();

        assert_eq!(record.image_path(), Some(existing.display().to_string().as_str()));
        assert_eq!(std::fs::read(&existing).unwrap(), b"jpeg");
    }

    #[tokio::test]
    async fn test_image_failure_keeps_record() {
        let dir = tempfile::tempdir().unwrap();
        let id = Identifier::new("22", "01", "01", 1);
        let html = format!(
            r#"{}<div style="background-image: url('http://127.0.0.1:1/x.jpg')"></div>"#,
            PAGE
        );
        let mut session = ScriptedSession::new(&html);

        let record = fetch_record(&id, &mut session, &context(dir.path()))
            .await
            .unwrap();

        assert_eq!(record.get("Name"), Some("Dara"));
        assert_eq!(record.image_path(), None);
    }
}
