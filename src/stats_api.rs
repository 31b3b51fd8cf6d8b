//! Stats API Client
//!
//! Read-only JSON client for the upstream stats service. Two roots:
//! `api_url` serves static JSON files, `db_api_url` serves player, team
//! and stat records.

use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::model::{Player, PlayerStats, SeasonStartDates, Team};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} not found")]
    NotFound { url: String },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

/// Whose stats to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Player,
    Team,
}

impl TargetKind {
    pub fn path(self) -> &'static str {
        match self {
            TargetKind::Player => "players",
            TargetKind::Team => "teams",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatType {
    Season,
    Career,
}

impl StatType {
    pub fn as_str(self) -> &'static str {
        match self {
            StatType::Season => "season",
            StatType::Career => "career",
        }
    }
}

#[derive(Clone)]
pub struct StatsApi {
    http: reqwest::Client,
    api_url: String,
    db_api_url: String,
}

impl StatsApi {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            api_url: config.api_url.clone(),
            db_api_url: config.db_api_url.clone(),
        }
    }

    /// Shared client with the configured request timeout
    pub fn http_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("blaseball-reference/", env!("CARGO_PKG_VERSION")))
            .build()
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ApiError> {
        tracing::debug!("GET {}", url);

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(source) => return Err(ApiError::Request { url, source }),
        };

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound { url });
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
            });
        }

        match response.json::<T>().await {
            Ok(body) => Ok(body),
            Err(source) => Err(ApiError::Decode { url, source }),
        }
    }

    pub async fn players(&self) -> Result<Vec<Player>, ApiError> {
        self.get_json(format!("{}/players", self.db_api_url)).await
    }

    pub async fn player(&self, slug: &str) -> Result<Player, ApiError> {
        self.get_json(format!(
            "{}/players/{}",
            self.db_api_url,
            urlencoding::encode(slug)
        ))
        .await
    }

    pub async fn teams(&self) -> Result<Vec<Team>, ApiError> {
        self.get_json(format!("{}/teams", self.db_api_url)).await
    }

    pub async fn team(&self, slug: &str) -> Result<Team, ApiError> {
        self.get_json(format!(
            "{}/teams/{}",
            self.db_api_url,
            urlencoding::encode(slug)
        ))
        .await
    }

    pub async fn pitching_stats(
        &self,
        kind: TargetKind,
        id: &str,
        stat_type: StatType,
        postseason: bool,
    ) -> Result<PlayerStats, ApiError> {
        self.get_json(format!(
            "{}/{}/{}/stats?group=pitching&type={}&postseason={}",
            self.db_api_url,
            kind.path(),
            urlencoding::encode(id),
            stat_type.as_str(),
            postseason
        ))
        .await
    }

    pub async fn season_start_dates(&self) -> Result<SeasonStartDates, ApiError> {
        self.get_json(format!("{}/seasonStartDates.json", self.api_url))
            .await
    }
}
