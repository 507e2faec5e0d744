pub mod blocks;
pub mod text;

use std::cell::Cell;
use std::collections::HashMap;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::images::ImageStore;
use crate::manifest::{Manifest, Post};
use crate::notion::types::{NotionPage, PropertyValue, SourceBlock};
use crate::notion::{paginate, ContentSource};
use blocks::Block;

const UNTITLED: &str = "Untitled";

const TITLE_PROPS: &[&str] = &["Title", "title"];
const SLUG_PROPS: &[&str] = &["Slug", "slug"];
const PUBLISHED_PROPS: &[&str] = &["Published", "published"];
const PUBLISHED_AT_PROPS: &[&str] = &["PublishedAt", "publishedAt", "Date"];
const EXCERPT_PROPS: &[&str] = &["Excerpt", "excerpt"];
const TAGS_PROPS: &[&str] = &["Tags", "tags"];
const COVER_PROPS: &[&str] = &["Cover", "cover"];

/// Turns remote documents into manifest posts, one awaited request at a time.
pub struct Normalizer<'a, S: ContentSource> {
    source: &'a S,
    images: &'a ImageStore,
    include_drafts: bool,
    image_fallbacks: Cell<usize>,
}

impl<'a, S: ContentSource> Normalizer<'a, S> {
    pub fn new(source: &'a S, images: &'a ImageStore, include_drafts: bool) -> Self {
        Self {
            source,
            images,
            include_drafts,
            image_fallbacks: Cell::new(0),
        }
    }

    /// Download one image, counting remote URLs kept after a failure.
    async fn localise(&self, url: &str) -> String {
        let outcome = self.images.download(url).await;
        if outcome.fell_back() {
            self.image_fallbacks.set(self.image_fallbacks.get() + 1);
        }
        outcome.into_url()
    }

    /// Every document in the database's data source, newest first.
    pub async fn list_documents(&self, database_id: &str) -> Result<Vec<NotionPage>> {
        let data_source_id = self
            .source
            .resolve_data_source(database_id)
            .await
            .context("Failed to resolve data source")?;
        debug!(%data_source_id, "Resolved data source");

        let pages = paginate(|cursor| self.source.query_documents(&data_source_id, cursor))
            .await
            .context("Failed to query documents")?;
        info!(count = pages.len(), "Fetched documents");
        Ok(pages)
    }

    /// Top-level blocks of one document, in order.
    pub async fn fetch_document_body(&self, document_id: &str) -> Result<Vec<SourceBlock>> {
        let raw = paginate(|cursor| self.source.list_children(document_id, cursor))
            .await
            .with_context(|| format!("Failed to fetch blocks for {}", document_id))?;

        raw.into_iter()
            .map(|b| SourceBlock::try_from(b).map_err(anyhow::Error::from))
            .collect()
    }

    /// Map one block to its manifest form; `None` for unsupported types.
    pub async fn normalize_block(&self, block: SourceBlock) -> Option<Block> {
        let block = match block {
            SourceBlock::Paragraph(p) => Block::Paragraph {
                rich_text: text::segments(&p.rich_text),
            },
            SourceBlock::Heading1(p) => Block::Heading1 {
                rich_text: text::segments(&p.rich_text),
            },
            SourceBlock::Heading2(p) => Block::Heading2 {
                rich_text: text::segments(&p.rich_text),
            },
            SourceBlock::Heading3(p) => Block::Heading3 {
                rich_text: text::segments(&p.rich_text),
            },
            SourceBlock::BulletedListItem(p) => Block::BulletedListItem {
                rich_text: text::segments(&p.rich_text),
            },
            SourceBlock::NumberedListItem(p) => Block::NumberedListItem {
                rich_text: text::segments(&p.rich_text),
            },
            SourceBlock::Quote(p) => Block::Quote {
                rich_text: text::segments(&p.rich_text),
            },
            SourceBlock::Code(c) => Block::Code {
                language: c.language,
                rich_text: text::segments(&c.rich_text),
            },
            SourceBlock::Image(img) => {
                let remote = img.source.url().unwrap_or_default();
                Block::Image {
                    url: self.localise(remote).await,
                    caption: text::segments(&img.caption),
                }
            }
            SourceBlock::Unsupported(kind) => {
                debug!(%kind, "Skipping unsupported block");
                return None;
            }
        };
        Some(block)
    }

    pub async fn normalize_blocks(&self, blocks: Vec<SourceBlock>) -> Vec<Block> {
        let mut out = Vec::with_capacity(blocks.len());
        for block in blocks {
            if let Some(b) = self.normalize_block(block).await {
                debug!(kind = b.type_tag(), "Normalized block");
                out.push(b);
            }
        }
        out
    }

    /// Build a post from one document, or `None` for a draft when drafts are excluded.
    pub async fn build_post(&self, page: &NotionPage) -> Result<Option<Post>> {
        let title = match page.property(TITLE_PROPS) {
            Some(PropertyValue::Title { title }) => text::plain_text(title),
            _ => UNTITLED.to_string(),
        };
        let explicit_slug = match page.property(SLUG_PROPS) {
            Some(PropertyValue::RichText { rich_text }) => text::plain_text(rich_text),
            _ => String::new(),
        };
        let slug = Some(text::compute_slug(&title, &explicit_slug))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| fallback_slug(&page.id));

        let published = matches!(
            page.property(PUBLISHED_PROPS),
            Some(PropertyValue::Checkbox { checkbox: true })
        );
        if !published && !self.include_drafts {
            debug!(%slug, "Skipping draft");
            return Ok(None);
        }

        let published_at = match page.property(PUBLISHED_AT_PROPS) {
            Some(PropertyValue::Date { date: Some(d) }) => d.start.clone(),
            _ => None,
        };
        let excerpt = match page.property(EXCERPT_PROPS) {
            Some(PropertyValue::RichText { rich_text }) => text::plain_text(rich_text),
            _ => String::new(),
        };
        let tags = match page.property(TAGS_PROPS) {
            Some(PropertyValue::MultiSelect { multi_select }) => {
                let mut tags: Vec<String> = Vec::with_capacity(multi_select.len());
                for opt in multi_select {
                    if !tags.contains(&opt.name) {
                        tags.push(opt.name.clone());
                    }
                }
                tags
            }
            _ => Vec::new(),
        };

        let mut cover_urls = Vec::new();
        for remote in cover_sources(page) {
            cover_urls.push(self.localise(&remote).await);
        }
        let cover_url = cover_urls.first().cloned();

        let body = self.fetch_document_body(&page.id).await?;
        let blocks = self.normalize_blocks(body).await;
        let reading_time = text::estimate_reading_time(&text::body_text(&blocks));

        Ok(Some(Post {
            id: page.id.clone(),
            title,
            slug,
            published,
            published_at,
            excerpt,
            tags,
            cover_url,
            cover_urls,
            reading_time,
            blocks,
        }))
    }

    /// Fetch, filter and normalize every document into a fresh manifest.
    pub async fn build_manifest(&self, database_id: &str) -> Result<Manifest> {
        let pages = self.list_documents(database_id).await?;

        let pb = ProgressBar::new(pages.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
                .progress_chars("=> "),
        );

        let mut posts = Vec::new();
        for page in &pages {
            pb.set_message(page.id.clone());
            if let Some(post) = self.build_post(page).await? {
                posts.push(post);
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        for (slug, count) in slug_collisions(&posts) {
            warn!(%slug, count, "Duplicate slug; only one post will be reachable");
        }
        info!(
            posts = posts.len(),
            skipped = pages.len() - posts.len(),
            include_drafts = self.include_drafts,
            image_fallbacks = self.image_fallbacks.get(),
            "Normalized documents"
        );

        Ok(Manifest::new(self.include_drafts, posts))
    }
}

/// Cover files from the cover property, else the page cover.
fn cover_sources(page: &NotionPage) -> Vec<String> {
    if let Some(PropertyValue::Files { files }) = page.property(COVER_PROPS) {
        if !files.is_empty() {
            return files
                .iter()
                .filter_map(|f| f.url())
                .filter(|u| !u.is_empty())
                .map(String::from)
                .collect();
        }
    }
    page.cover
        .as_ref()
        .and_then(|c| c.url())
        .filter(|u| !u.is_empty())
        .map(|u| vec![u.to_string()])
        .unwrap_or_default()
}

fn fallback_slug(id: &str) -> String {
    let slug = text::slugify(id);
    if slug.is_empty() {
        UNTITLED.to_lowercase()
    } else {
        format!("post-{}", slug)
    }
}

/// Slugs used by more than one post, in first-seen order.
fn slug_collisions(posts: &[Post]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();
    for post in posts {
        let count = counts.entry(post.slug.as_str()).or_insert(0);
        if *count == 0 {
            order.push(post.slug.as_str());
        }
        *count += 1;
    }
    order
        .into_iter()
        .filter_map(|slug| {
            let count = counts[slug];
            (count > 1).then(|| (slug.to_string(), count))
        })
        .collect()
}
