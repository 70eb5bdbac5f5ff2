//! PostgREST (Supabase) backed analysis cache.
//!
//! Table layout: `image_hash text primary key, analysis_result jsonb`.
//! See: <https://postgrest.org/en/stable/references/api/tables_views.html>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use super::CacheStore;
use crate::{GatewayError, Result};

/// Default table holding cached analyses.
pub const DEFAULT_TABLE: &str = "food_analysis_cache";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Cache store backed by a PostgREST table.
#[derive(Clone)]
pub struct PostgrestCacheStore {
    base_url: String,
    api_key: String,
    table: String,
    http: Client,
}

impl std::fmt::Debug for PostgrestCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestCacheStore")
            .field("base_url", &self.base_url)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl PostgrestCacheStore {
    /// Create a store for `base_url` (the project URL, without `/rest/v1`).
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            table: DEFAULT_TABLE.to_string(),
            http,
        })
    }

    /// Use a different table name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}

#[derive(Deserialize)]
struct Row {
    analysis_result: Value,
}

#[derive(Serialize)]
struct NewRow<'a> {
    image_hash: &'a str,
    analysis_result: &'a Value,
}

#[async_trait]
impl CacheStore for PostgrestCacheStore {
    fn name(&self) -> &str {
        "postgrest"
    }

    #[instrument(skip(self), fields(table = %self.table))]
    async fn get(&self, image_hash: &str) -> Result<Option<Value>> {
        let filter = format!("eq.{image_hash}");
        let response = self
            .authorized(self.http.get(self.table_url()))
            .query(&[
                ("image_hash", filter.as_str()),
                ("select", "analysis_result"),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::Cache(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Cache(format!("lookup failed: HTTP {status}")));
        }

        let rows: Vec<Row> = response
            .json()
            .await
            .map_err(|e| GatewayError::Cache(format!("unreadable lookup response: {e}")))?;
        Ok(rows.into_iter().next().map(|r| r.analysis_result))
    }

    #[instrument(skip(self, analysis), fields(table = %self.table))]
    async fn insert(&self, image_hash: &str, analysis: &Value) -> Result<()> {
        let response = self
            .authorized(self.http.post(self.table_url()))
            .header("Prefer", "return=minimal")
            .json(&NewRow {
                image_hash,
                analysis_result: analysis,
            })
            .send()
            .await
            .map_err(|e| GatewayError::Cache(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Cache(format!("insert failed: HTTP {status}")));
        }
        Ok(())
    }
}
