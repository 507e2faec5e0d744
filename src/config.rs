use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_MANIFEST_PATH: &str = "src/data/posts.json";
pub const DEFAULT_IMAGE_DIR: &str = "public/images/blog";
pub const DEFAULT_IMAGE_PREFIX: &str = "/images/blog";
pub const NOTION_API_BASE: &str = "https://api.notion.com";
pub const NOTION_VERSION: &str = "2025-09-03";

/// Where the run writes its artifacts.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub manifest: PathBuf,
    pub image_dir: PathBuf,
    /// Public URL prefix the site serves `image_dir` under.
    pub image_url_prefix: String,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from(DEFAULT_MANIFEST_PATH),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            image_url_prefix: DEFAULT_IMAGE_PREFIX.to_string(),
        }
    }
}

/// Everything a `fetch` run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub token: String,
    pub database_id: String,
    pub include_drafts: bool,
    pub api_base: String,
    pub notion_version: String,
    pub paths: OutputPaths,
}

impl FetchConfig {
    /// Validate raw CLI/env values. Blank values count as missing.
    pub fn from_args(
        token: Option<String>,
        database_id: Option<String>,
        include_drafts: bool,
        api_base: String,
        paths: OutputPaths,
    ) -> Result<Self, ConfigError> {
        let token = required(token, "NOTION_TOKEN")?;
        let database_id = required(database_id, "NOTION_DATABASE_ID")?;

        Ok(Self {
            token,
            database_id,
            include_drafts,
            api_base: api_base.trim_end_matches('/').to_string(),
            notion_version: NOTION_VERSION.to_string(),
            paths,
        })
    }
}

fn required(value: Option<String>, var: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::Missing { var }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(token: Option<&str>, db: Option<&str>) -> Result<FetchConfig, ConfigError> {
        FetchConfig::from_args(
            token.map(String::from),
            db.map(String::from),
            false,
            format!("{}/", NOTION_API_BASE),
            OutputPaths::default(),
        )
    }

    #[test]
    fn missing_token() {
        let err = build(None, Some("db")).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { var: "NOTION_TOKEN" }));
        assert!(err.to_string().contains("NOTION_TOKEN"));
    }

    #[test]
    fn blank_database_id_is_missing() {
        let err = build(Some("secret"), Some("   ")).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { var: "NOTION_DATABASE_ID" }));
    }

    #[test]
    fn valid_config() {
        let cfg = build(Some(" secret "), Some("db-1")).unwrap();
        assert_eq!(cfg.token, "secret");
        assert_eq!(cfg.database_id, "db-1");
        assert_eq!(cfg.api_base, NOTION_API_BASE);
        assert_eq!(cfg.notion_version, NOTION_VERSION);
        assert_eq!(cfg.paths.manifest, PathBuf::from(DEFAULT_MANIFEST_PATH));
    }
}
