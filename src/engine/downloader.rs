//! Resource downloads with name-based dedup.

use reqwest::Client;
use std::path::{Path, PathBuf};
use url::Url;

/// What became of one resource download attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// File name of a downloaded (or reused) resource.
    Saved(String),
    /// Inline-encoded value; nothing to fetch, not a failure.
    Skipped,
    /// Fetch or write failure. The message goes to the caller's log; the
    /// owning rule proceeds with whatever else succeeded.
    Failed(String),
}

/// Downloads `location` into `dir` (the working directory when `None`),
/// returning the local identifier on success.
///
/// The identifier is the location's trailing path segment. If a file with
/// that name already exists it is reused without a network round trip —
/// content identity is assumed from the name alone. The exists-then-write
/// sequence is not atomic across workers: two workers racing on the same
/// name may both fetch, and the second write wins.
pub async fn download_resource(
    client: &Client,
    location: &str,
    dir: Option<&Path>,
) -> DownloadOutcome {
    if location.starts_with("data:") {
        return DownloadOutcome::Skipped;
    }

    let Some(file_name) = local_identifier(location) else {
        return DownloadOutcome::Failed(format!("no file name in '{}'", location));
    };

    let path = match dir {
        Some(dir) => dir.join(&file_name),
        None => PathBuf::from(&file_name),
    };

    if path.exists() {
        tracing::debug!("reusing existing resource {}", path.display());
        return DownloadOutcome::Saved(file_name);
    }

    let bytes = match fetch_bytes(client, location).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return DownloadOutcome::Failed(format!("download of {} failed: {}", location, e));
        }
    };

    if let Err(e) = tokio::fs::write(&path, &bytes).await {
        return DownloadOutcome::Failed(format!("write of {} failed: {}", path.display(), e));
    }

    tracing::debug!("saved resource {} ({} bytes)", path.display(), bytes.len());
    DownloadOutcome::Saved(file_name)
}

async fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>, reqwest::Error> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Trailing path segment of a location. Query and fragment are stripped
/// when the location parses as an absolute URL; otherwise the raw text
/// after the last `/` is used.
fn local_identifier(location: &str) -> Option<String> {
    let segment = match Url::parse(location) {
        Ok(url) => url.path_segments()?.last().unwrap_or("").to_string(),
        Err(_) => location.rsplit('/').next().unwrap_or(location).to_string(),
    };

    if segment.is_empty() {
        None
    } else {
        Some(segment)
    }
}
