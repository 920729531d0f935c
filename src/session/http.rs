//! Plain HTTP session
//!
//! Renders nothing: the page content is the response body as served. Suitable
//! for server-rendered targets and for tests against a mock host.

use crate::session::Session;
use crate::{SessionError, SessionResult};
use async_trait::async_trait;
use reqwest::Client;

/// Session backed by a shared reqwest client
pub struct HttpSession {
    client: Client,
    page: Option<String>,
}

impl HttpSession {
    pub fn new(client: Client) -> Self {
        Self { client, page: None }
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn navigate(&mut self, url: &str) -> SessionResult<()> {
        self.page = None;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SessionError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        // Error statuses still carry a page; the extractor decides whether
        // it holds any data.
        if !response.status().is_success() {
            tracing::debug!("{} returned HTTP {}", url, response.status().as_u16());
        }

        let body = response
            .text()
            .await
            .map_err(|e| SessionError::Content(e.to_string()))?;

        self.page = Some(body);
        Ok(())
    }

    async fn content(&mut self) -> SessionResult<String> {
        self.page.clone().ok_or(SessionError::NotNavigated)
    }

    async fn close(&mut self) -> SessionResult<()> {
        self.page = None;
        Ok(())
    }
}
