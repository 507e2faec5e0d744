pub mod types;

use std::future::Future;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::FetchConfig;
use crate::error::NotionError;
use types::{DatabaseInfo, NotionPage, Paginated, QueryBody, RawBlock, SortSpec};

/// Property the posts query is sorted on, newest first.
pub const SORT_PROPERTY: &str = "PublishedAt";

const PAGE_SIZE: &str = "100";

/// Page-level access to a remote posts database.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Resolve the queryable data source behind a database.
    async fn resolve_data_source(&self, database_id: &str) -> Result<String, NotionError>;

    /// One page of documents, newest first.
    async fn query_documents(
        &self,
        data_source_id: &str,
        cursor: Option<String>,
    ) -> Result<Paginated<NotionPage>, NotionError>;

    /// One page of a block's children.
    async fn list_children(
        &self,
        block_id: &str,
        cursor: Option<String>,
    ) -> Result<Paginated<RawBlock>, NotionError>;
}

/// Drain a cursor-paginated endpoint, one awaited request at a time.
pub async fn paginate<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, NotionError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Paginated<T>, NotionError>>,
{
    let mut items = Vec::new();
    let mut cursor = None;

    loop {
        let page = fetch_page(cursor.take()).await?;
        items.extend(page.results);
        if !page.has_more {
            break;
        }
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => return Err(NotionError::MissingCursor),
        }
    }

    Ok(items)
}

pub struct NotionClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
    version: String,
}

impl NotionClient {
    pub fn new(token: String, base_url: String, version: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url,
            version,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            config.token.clone(),
            config.api_base.clone(),
            config.notion_version.clone(),
        )
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, NotionError> {
        let resp = request
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.version)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotionError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl ContentSource for NotionClient {
    async fn resolve_data_source(&self, database_id: &str) -> Result<String, NotionError> {
        let url = format!("{}/v1/databases/{}", self.base_url, database_id);
        let db: DatabaseInfo = self.send(self.client.get(&url)).await?;

        db.data_sources
            .into_iter()
            .next()
            .map(|ds| ds.id)
            .ok_or_else(|| NotionError::NoDataSource {
                database_id: database_id.to_string(),
            })
    }

    async fn query_documents(
        &self,
        data_source_id: &str,
        cursor: Option<String>,
    ) -> Result<Paginated<NotionPage>, NotionError> {
        let url = format!("{}/v1/data_sources/{}/query", self.base_url, data_source_id);
        let body = QueryBody {
            sorts: vec![SortSpec {
                property: SORT_PROPERTY.to_string(),
                direction: "descending",
            }],
            start_cursor: cursor,
        };

        let page: Paginated<NotionPage> = self.send(self.client.post(&url).json(&body)).await?;
        debug!(data_source_id, count = page.results.len(), has_more = page.has_more, "Fetched document page");
        Ok(page)
    }

    async fn list_children(
        &self,
        block_id: &str,
        cursor: Option<String>,
    ) -> Result<Paginated<RawBlock>, NotionError> {
        let url = format!("{}/v1/blocks/{}/children", self.base_url, block_id);
        let mut query = vec![("page_size", PAGE_SIZE.to_string())];
        if let Some(cursor) = cursor {
            query.push(("start_cursor", cursor));
        }

        let page: Paginated<RawBlock> = self.send(self.client.get(&url).query(&query)).await?;
        debug!(block_id, count = page.results.len(), has_more = page.has_more, "Fetched block page");
        Ok(page)
    }
}
