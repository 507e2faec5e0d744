mod config;
mod error;
mod images;
mod manifest;
mod normalize;
mod notion;
#[cfg(test)]
mod test_support;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use config::{FetchConfig, OutputPaths};
use images::ImageStore;
use manifest::Manifest;
use normalize::Normalizer;
use notion::NotionClient;

#[derive(Parser)]
#[command(name = "notion_posts", about = "Bake Notion blog posts into a static posts.json")]
struct Cli {
    /// Manifest file read and written by every command
    #[arg(long, global = true, default_value = config::DEFAULT_MANIFEST_PATH)]
    manifest: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch posts from Notion and regenerate the manifest
    Fetch {
        /// Keep unpublished posts in the output
        #[arg(long)]
        include_drafts: bool,
        /// Notion integration token
        #[arg(long, env = "NOTION_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Notion database holding the posts
        #[arg(long, env = "NOTION_DATABASE_ID")]
        database_id: Option<String>,
        /// Directory downloaded images are written to
        #[arg(long, default_value = config::DEFAULT_IMAGE_DIR)]
        image_dir: PathBuf,
        /// Public URL prefix for downloaded images
        #[arg(long, default_value = config::DEFAULT_IMAGE_PREFIX)]
        image_prefix: String,
        /// Notion API base URL
        #[arg(long, default_value = config::NOTION_API_BASE)]
        api_base: String,
    },
    /// List the posts the site would show
    List {
        /// Include unpublished posts
        #[arg(long, env = "SHOW_DRAFTS")]
        show_drafts: bool,
    },
    /// Preview one post by slug
    Show {
        slug: String,
        /// Include unpublished posts
        #[arg(long, env = "SHOW_DRAFTS")]
        show_drafts: bool,
    },
    /// Remove unpublished posts from the manifest
    StripDrafts,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            include_drafts,
            token,
            database_id,
            image_dir,
            image_prefix,
            api_base,
        } => {
            let paths = OutputPaths {
                manifest: cli.manifest,
                image_dir,
                image_url_prefix: image_prefix,
            };
            let config = FetchConfig::from_args(token, database_id, include_drafts, api_base, paths)?;
            let count = fetch(&config).await.context("Failed to fetch Notion posts")?;
            println!("Wrote {} posts to {}", count, config.paths.manifest.display());
        }
        Commands::List { show_drafts } => {
            let manifest = Manifest::load(&cli.manifest)?;
            let posts: Vec<_> = manifest.visible_posts(show_drafts).collect();
            if posts.is_empty() {
                println!("No posts. Run 'fetch' first.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<32} | {:<36} | {:<5} | {:<10} | {:>3}",
                "#", "Slug", "Title", "Live", "Date", "Min"
            );
            println!("{}", "-".repeat(104));
            for (i, p) in posts.iter().enumerate() {
                println!(
                    "{:>3} | {:<32} | {:<36} | {:<5} | {:<10} | {:>3}",
                    i + 1,
                    truncate(&p.slug, 32),
                    truncate(&p.title, 36),
                    if p.published { "yes" } else { "draft" },
                    p.published_at.as_deref().unwrap_or("-"),
                    p.reading_time
                );
            }
            println!("\n{} posts | generated {}", posts.len(), manifest.generated_at);
        }
        Commands::Show { slug, show_drafts } => {
            let manifest = Manifest::load(&cli.manifest)?;
            let post = manifest
                .find_visible(&slug, show_drafts)
                .with_context(|| format!("No visible post with slug '{}'", slug))?;

            println!("{}", post.title);
            println!("{}", "=".repeat(post.title.chars().count()));
            println!(
                "{} | {} min read{}",
                post.published_at.as_deref().unwrap_or("undated"),
                post.reading_time,
                if post.published { "" } else { " | draft" }
            );
            if !post.tags.is_empty() {
                println!("Tags: {}", post.tags.join(", "));
            }
            if !post.excerpt.is_empty() {
                println!("\n{}", post.excerpt);
            }
            println!("\n{}", normalize::blocks::render_preview(&post.blocks));
        }
        Commands::StripDrafts => {
            let mut manifest = Manifest::load(&cli.manifest)?;
            let removed = manifest.strip_drafts();
            manifest.write(&cli.manifest)?;
            println!(
                "Removed {} drafts, {} posts remain in {}",
                removed,
                manifest.posts.len(),
                cli.manifest.display()
            );
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        info!("Done in {:.1}s", elapsed.as_secs_f64());
    }

    Ok(())
}

/// Run the normalizer and replace the manifest. Returns the post count.
async fn fetch(config: &FetchConfig) -> anyhow::Result<usize> {
    let client = NotionClient::from_config(config);
    let images = ImageStore::from_paths(&config.paths);
    let normalizer = Normalizer::new(&client, &images, config.include_drafts);

    let manifest = normalizer.build_manifest(&config.database_id).await?;
    manifest.write(&config.paths.manifest)?;
    Ok(manifest.posts.len())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
