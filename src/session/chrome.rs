//! Headless Chromium session
//!
//! Each session owns its own browser process and a single tab that is reused
//! for every navigation.

use crate::session::Session;
use crate::{SessionError, SessionResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    /// Launches a headless browser and opens a blank tab
    pub async fn launch() -> SessionResult<Self> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(SessionError::Launch)?;

        let (browser, mut events) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        // The CDP event loop must be driven for the browser to make progress
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(SessionError::Launch(e.to_string()));
            }
        };

        Ok(Self {
            browser,
            page,
            handler,
        })
    }
}

#[async_trait]
impl Session for ChromeSession {
    async fn navigate(&mut self, url: &str) -> SessionResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn content(&mut self) -> SessionResult<String> {
        self.page
            .content()
            .await
            .map_err(|e| SessionError::Content(e.to_string()))
    }

    async fn close(&mut self) -> SessionResult<()> {
        let result = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Close(e.to_string()));

        if result.is_ok() {
            if let Err(e) = self.browser.wait().await {
                tracing::debug!("Browser process did not exit cleanly: {}", e);
            }
        }

        self.handler.abort();
        result
    }
}
