//! Rendering sessions and the pinned session pool
//!
//! A session is a long-lived, stateful handle to something that can load a URL
//! and expose the resulting page content. Sessions are expensive to start, so
//! the harvester creates a fixed number up front and reuses them for the whole
//! run.

#[cfg(feature = "chrome")]
mod chrome;
mod http;
mod pool;

#[cfg(feature = "chrome")]
pub use chrome::ChromeSession;
pub use http::HttpSession;
pub use pool::{SessionLease, SessionPool};

use crate::SessionResult;
use async_trait::async_trait;

/// A stateful content-rendering handle
///
/// Implementations are never used by two fetches at once; the pool guarantees
/// exclusive access, so methods take `&mut self`.
#[async_trait]
pub trait Session: Send {
    /// Loads the given URL, replacing the current page
    async fn navigate(&mut self, url: &str) -> SessionResult<()>;

    /// Returns the current rendered content of the page
    ///
    /// For client-side rendered pages this may change between calls while the
    /// page is still loading.
    async fn content(&mut self) -> SessionResult<String>;

    /// Releases the underlying engine
    async fn close(&mut self) -> SessionResult<()>;
}
