//! Roster-Harvest: a checkpointing record harvester
//!
//! This crate enumerates a deterministic student identifier space, renders each
//! identifier's record page through a pool of reusable sessions, extracts the
//! key/value fields (and profile image) it finds, and persists results batch by
//! batch so that partial progress survives failures.

pub mod config;
pub mod harvester;
pub mod identifier;
pub mod output;
pub mod record;
pub mod session;

use thiserror::Error;

/// Main error type for run-level failures
///
/// Only these errors abort a harvest. Per-identifier problems are reported as
/// [`FetchError`] and stay contained inside the batch that produced them.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to start session {index} of the pool: {source}")]
    SessionInit {
        index: usize,
        source: SessionError,
    },

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Harvest interrupted")]
    Interrupted,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors raised by a rendering session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to launch session: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Failed to read page content: {0}")]
    Content(String),

    #[error("Failed to close session: {0}")]
    Close(String),

    #[error("Session used before navigating to a page")]
    NotNavigated,
}

/// Outcome of a single identifier fetch that did not produce a record
#[derive(Debug, Error)]
pub enum FetchError {
    /// The page rendered without any extractable fields. Expected at scale,
    /// since most generated identifiers do not belong to a real student.
    #[error("No data for {identifier}")]
    NoData { identifier: String },

    /// Anything else that went wrong while fetching this identifier
    #[error("Unexpected failure for {identifier}: {source}")]
    Unexpected {
        identifier: String,
        source: SessionError,
    },
}

/// Profile image download errors; never fatal to the fetch
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Image request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Image request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("Invalid image URL {url}: {source}")]
    Url {
        url: String,
        source: ::url::ParseError,
    },

    #[error("Failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while persisting checkpoints
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for run-level operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

// Re-export commonly used types
pub use config::Config;
pub use identifier::{generate_identifiers, Identifier};
pub use record::Record;
pub use session::{Session, SessionPool};
