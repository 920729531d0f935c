//! Profile image downloads
//!
//! Images are stored once per identifier and never overwritten, so re-running
//! a harvest does not re-download pictures it already has.

use crate::AssetError;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// What happened to an identifier's image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetOutcome {
    /// Fetched and written to disk
    Downloaded(PathBuf),

    /// A file already existed; no request was made
    AlreadyPresent(PathBuf),
}

impl AssetOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Downloaded(path) | Self::AlreadyPresent(path) => path,
        }
    }
}

/// Local path for an identifier's image
pub fn asset_path(image_dir: &Path, identifier: &str) -> PathBuf {
    image_dir.join(format!("{}.jpg", identifier))
}

/// Downloads `url` to `path` unless `path` already exists
///
/// The body is written to a sibling `.part` file first and renamed into place,
/// so an interrupted download never leaves a truncated image behind.
///
/// # Returns
///
/// * `Ok(AssetOutcome)` - The image is on disk at `path`
/// * `Err(AssetError)` - Non-2xx response, transport failure, or IO failure
pub async fn download_asset(
    client: &Client,
    url: &str,
    path: &Path,
) -> Result<AssetOutcome, AssetError> {
    if tokio::fs::try_exists(path).await? {
        tracing::debug!("Image already present at {}", path.display());
        return Ok(AssetOutcome::AlreadyPresent(path.to_path_buf()));
    }

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| AssetError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(AssetError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|source| AssetError::Request {
            url: url.to_string(),
            source,
        })?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension("jpg.part");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(&bytes).await?;
    file.flush().await?;
    drop(file);

    // Another run may have written the file meanwhile
    if tokio::fs::try_exists(path).await? {
        tokio::fs::remove_file(&tmp).await?;
        return Ok(AssetOutcome::AlreadyPresent(path.to_path_buf()));
    }

    tokio::fs::rename(&tmp, path).await?;
    Ok(AssetOutcome::Downloaded(path.to_path_buf()))
}
