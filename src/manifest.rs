use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::normalize::blocks::Block;

pub const SOURCE_TAG: &str = "notion";

/// One blog post as the site consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub published: bool,
    pub published_at: Option<String>,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub cover_url: Option<String>,
    #[serde(default)]
    pub cover_urls: Vec<String>,
    pub reading_time: u32,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// The generated `posts.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(serialize_with = "iso_millis")]
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub include_drafts: bool,
    pub posts: Vec<Post>,
}

fn iso_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl Manifest {
    pub fn new(include_drafts: bool, posts: Vec<Post>) -> Self {
        Self {
            generated_at: Utc::now(),
            source: SOURCE_TAG.to_string(),
            include_drafts,
            posts,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))
    }

    /// Replace the file at `path`. The old file stays intact until the final rename.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(self)?;
        let tmp = temp_path(path);
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e).with_context(|| format!("Failed to replace {}", path.display()));
        }
        Ok(())
    }

    /// Posts the site shows: published ones, or everything when previewing drafts.
    pub fn visible_posts(&self, show_drafts: bool) -> impl Iterator<Item = &Post> {
        self.posts.iter().filter(move |p| p.published || show_drafts)
    }

    pub fn find_visible(&self, slug: &str, show_drafts: bool) -> Option<&Post> {
        self.visible_posts(show_drafts).find(|p| p.slug == slug)
    }

    /// Drop drafts for a production build. Returns how many were removed.
    pub fn strip_drafts(&mut self) -> usize {
        let before = self.posts.len();
        self.posts.retain(|p| p.published);
        self.include_drafts = false;
        before - self.posts.len()
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
