use thiserror::Error;

/// Configuration problems detected before any network call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "missing {var} in environment.\n\
         Example: NOTION_TOKEN=... NOTION_DATABASE_ID=... notion_posts fetch"
    )]
    Missing { var: &'static str },
}

/// Failures talking to the Notion API.
#[derive(Debug, Error)]
pub enum NotionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notion API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("no data source found for database {database_id}")]
    NoDataSource { database_id: String },

    #[error("response reported more results but no next_cursor")]
    MissingCursor,

    #[error("could not decode {what}: {source}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reasons a single image could not be localised. Never fatal.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}
