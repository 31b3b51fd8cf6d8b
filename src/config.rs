//! Runtime configuration, read once from environment variables at startup.

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.blaseball-reference.com";
pub const DEFAULT_DB_API_URL: &str = "https://api.blaseball-reference.com/v2";

/// Upstream data is revalidated on a fixed interval, not per request
pub const DEFAULT_REVALIDATE_SECS: u64 = 2700;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    /// Static JSON files (season start dates)
    pub api_url: String,
    /// Player, team and stat records
    pub db_api_url: String,
    pub revalidate: Duration,
    pub http_timeout: Duration,
    pub search: SearchConfig,
    pub static_dir: String,
}

/// Hosted search index. Without an app id the server falls back to the
/// in-process index.
#[derive(Clone, PartialEq)]
pub struct SearchConfig {
    pub url: Option<String>,
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub index: String,
    pub debounce: Duration,
    pub hits_per_page: usize,
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("url", &self.url)
            .field("app_id", &self.app_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("index", &self.index)
            .field("debounce", &self.debounce)
            .field("hits_per_page", &self.hits_per_page)
            .finish()
    }
}

impl SearchConfig {
    pub fn is_hosted(&self) -> bool {
        self.app_id.is_some() && self.api_key.is_some()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: None,
            app_id: None,
            api_key: None,
            index: "blaseball_reference".to_string(),
            debounce: Duration::from_millis(250),
            hits_per_page: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            api_url: DEFAULT_API_URL.to_string(),
            db_api_url: DEFAULT_DB_API_URL.to_string(),
            revalidate: Duration::from_secs(DEFAULT_REVALIDATE_SECS),
            http_timeout: Duration::from_secs(10),
            search: SearchConfig::default(),
            static_dir: "static".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset or unparseable values keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let parsed = |key: &str| non_empty(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            port: non_empty("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            api_url: non_empty("STATS_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            db_api_url: non_empty("STATS_DB_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.db_api_url),
            revalidate: parsed("REVALIDATE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.revalidate),
            http_timeout: parsed("HTTP_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            search: SearchConfig {
                url: non_empty("SEARCH_URL").map(|u| u.trim_end_matches('/').to_string()),
                app_id: non_empty("SEARCH_APP_ID"),
                api_key: non_empty("SEARCH_API_KEY"),
                index: non_empty("SEARCH_INDEX").unwrap_or(defaults.search.index),
                debounce: parsed("SEARCH_DEBOUNCE_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.search.debounce),
                hits_per_page: parsed("SEARCH_HITS_PER_PAGE")
                    .map(|n| n as usize)
                    .unwrap_or(defaults.search.hits_per_page),
            },
            static_dir: non_empty("STATIC_DIR").unwrap_or(defaults.static_dir),
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("Configuration:");
        tracing::info!("  PORT: {}", self.port);
        tracing::info!("  STATS_API_URL: {}", self.api_url);
        tracing::info!("  STATS_DB_API_URL: {}", self.db_api_url);
        tracing::info!("  REVALIDATE_SECS: {}", self.revalidate.as_secs());
        tracing::info!("  HTTP_TIMEOUT_SECS: {}", self.http_timeout.as_secs());
        tracing::info!(
            "  SEARCH: {}",
            if self.search.is_hosted() { "hosted index" } else { "local index" }
        );
        tracing::info!("  STATIC_DIR: {}", self.static_dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
        assert_eq!(config.revalidate, Duration::from_secs(2700));
        assert!(!config.search.is_hosted());
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let env: HashMap<&str, &str> = [
            ("PORT", "8080"),
            ("STATS_DB_API_URL", "http://localhost:9000/v2/"),
            ("REVALIDATE_SECS", "sixty"),
            ("SEARCH_APP_ID", "APP"),
            ("SEARCH_API_KEY", "KEY"),
            ("SEARCH_DEBOUNCE_MS", "0"),
        ]
        .into_iter()
        .collect();

        let config = Config::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.port, 8080);
        assert_eq!(config.db_api_url, "http://localhost:9000/v2");
        assert_eq!(config.revalidate, Duration::from_secs(DEFAULT_REVALIDATE_SECS));
        assert!(config.search.is_hosted());
        assert_eq!(config.search.debounce, Duration::ZERO);
        assert!(!format!("{:?}", config).contains("KEY"));
    }
}
