use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::OutputPaths;
use crate::error::ImageError;

const DEFAULT_EXTENSION: &str = ".jpg";

/// What happened to one image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Empty, relative or otherwise non-remote; left as-is.
    Unchanged(String),
    /// Stored locally; `local` is the public path to reference.
    Saved { remote: String, local: String },
    /// Download failed; the remote URL is kept.
    FellBack { url: String, reason: String },
}

impl DownloadOutcome {
    /// The reference to store in the manifest.
    pub fn into_url(self) -> String {
        match self {
            DownloadOutcome::Unchanged(url) => url,
            DownloadOutcome::Saved { local, .. } => local,
            DownloadOutcome::FellBack { url, .. } => url,
        }
    }

    pub fn fell_back(&self) -> bool {
        matches!(self, DownloadOutcome::FellBack { .. })
    }
}

/// Copies remote images into the site's public directory.
pub struct ImageStore {
    client: reqwest::Client,
    dir: PathBuf,
    url_prefix: String,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            dir: dir.into(),
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_paths(paths: &OutputPaths) -> Self {
        Self::new(paths.image_dir.clone(), paths.image_url_prefix.clone())
    }

    /// Localise `url`. Never fails: errors degrade to `FellBack` with the original URL.
    pub async fn download(&self, url: &str) -> DownloadOutcome {
        if !is_remote(url) {
            return DownloadOutcome::Unchanged(url.to_string());
        }

        match self.fetch_to_disk(url).await {
            Ok(local) => {
                info!(%url, %local, "Saved image");
                DownloadOutcome::Saved {
                    remote: url.to_string(),
                    local,
                }
            }
            Err(e) => {
                warn!(%url, error = %e, "Failed to download image, keeping remote URL");
                DownloadOutcome::FellBack {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn fetch_to_disk(&self, url: &str) -> Result<String, ImageError> {
        let filename = format!("{}{}", Uuid::new_v4(), extension_for(url)?);

        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ImageError::Status(status.as_u16()));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let dest = self.dir.join(&filename);
        if let Err(e) = stream_to_file(resp, &dest).await {
            let _ = tokio::fs::remove_file(&dest).await;
            return Err(e);
        }

        Ok(format!("{}/{}", self.url_prefix, filename))
    }
}

async fn stream_to_file(resp: reqwest::Response, dest: &Path) -> Result<(), ImageError> {
    let mut file = tokio::fs::File::create(dest).await?;
    let mut body = resp.bytes_stream();
    while let Some(chunk) = body.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;
    Ok(())
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// `.ext` of the URL path, ignoring the query string.
fn extension_for(url: &str) -> Result<String, ImageError> {
    let parsed = url::Url::parse(url)?;
    let ext = Path::new(parsed.path())
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    Ok(ext)
}
