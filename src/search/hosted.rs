//! Hosted search index client (Algolia REST query API)

use async_trait::async_trait;
use serde::Deserialize;

use super::{Attribution, SearchBackend, SearchError, SearchRecord};
use crate::config::SearchConfig;

pub const ALGOLIA_ATTRIBUTION: Attribution = Attribution {
    label: "Search by Algolia",
    href: "https://algolia.com",
    logo: "/static/search-by-algolia.svg",
};

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    hits: Vec<SearchRecord>,
}

#[derive(Clone)]
pub struct HostedSearch {
    http: reqwest::Client,
    endpoint: String,
    app_id: String,
    api_key: String,
    hits_per_page: usize,
}

impl HostedSearch {
    /// None when the config carries no credentials
    pub fn from_config(config: &SearchConfig, http: reqwest::Client) -> Option<Self> {
        let app_id = config.app_id.clone()?;
        let api_key = config.api_key.clone()?;

        let base = config
            .url
            .clone()
            .unwrap_or_else(|| format!("https://{}-dsn.algolia.net", app_id.to_lowercase()));

        Some(Self {
            http,
            endpoint: format!(
                "{}/1/indexes/{}/query",
                base,
                urlencoding::encode(&config.index)
            ),
            app_id,
            api_key,
            hits_per_page: config.hits_per_page,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SearchBackend for HostedSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchRecord>, SearchError> {
        let params = format!(
            "query={}&hitsPerPage={}",
            urlencoding::encode(query),
            self.hits_per_page
        );

        let response = self
            .http
            .post(&self.endpoint)
            .header("X-Algolia-Application-Id", &self.app_id)
            .header("X-Algolia-API-Key", &self.api_key)
            .json(&serde_json::json!({ "params": params }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body: QueryResponse = response.json().await?;
        tracing::debug!("Hosted search '{}' returned {} hits", query, body.hits.len());
        Ok(body.hits)
    }

    fn attribution(&self) -> Option<Attribution> {
        Some(ALGOLIA_ATTRIBUTION)
    }
}
