//! Stats Cache - revalidating layer over the stats API
//!
//! Successful responses are kept for the revalidation interval (2700s by
//! default). Failures are logged and never cached, and every accessor
//! degrades to an absent value instead of failing the page.

use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::model::{Player, PlayerStats, SeasonStartDates, Team};
use crate::stats_api::{ApiError, StatType, StatsApi, TargetKind};

/// Result of looking up a single record by slug
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    /// Upstream failed; render without the data
    Unavailable,
}

impl<T> Lookup<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
            Lookup::Unavailable => Lookup::Unavailable,
        }
    }
}

pub struct StatsCache {
    api: StatsApi,
    cache: Cache<String, serde_json::Value>,
}

impl StatsCache {
    pub fn new(api: StatsApi, revalidate: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(revalidate)
            .build();
        Self { api, cache }
    }

    async fn cached<T, F, Fut>(&self, key: String, fetch: F) -> Result<T, ApiError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if let Some(cached) = self.cache.get(&key).await {
            match serde_json::from_value(cached) {
                Ok(value) => {
                    tracing::debug!("Cache hit for {}", key);
                    return Ok(value);
                }
                Err(e) => tracing::warn!("Dropping undecodable cache entry {}: {}", key, e),
            }
        }

        let value = fetch().await?;
        match serde_json::to_value(&value) {
            Ok(json) => self.cache.insert(key, json).await,
            Err(e) => tracing::warn!("Not caching {}: {}", key, e),
        }
        Ok(value)
    }

    fn degrade<T>(what: &str, result: Result<T, ApiError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", what, e);
                None
            }
        }
    }

    fn lookup<T>(what: &str, result: Result<T, ApiError>) -> Lookup<T> {
        match result {
            Ok(value) => Lookup::Found(value),
            Err(e) if e.is_not_found() => Lookup::NotFound,
            Err(e) => {
                tracing::warn!("Failed to load {}: {}", what, e);
                Lookup::Unavailable
            }
        }
    }

    pub async fn players(&self) -> Option<Vec<Player>> {
        let result = self
            .cached("players".to_string(), || self.api.players())
            .await;
        Self::degrade("players", result)
    }

    pub async fn teams(&self) -> Option<Vec<Team>> {
        let result = self.cached("teams".to_string(), || self.api.teams()).await;
        Self::degrade("teams", result)
    }

    pub async fn season_start_dates(&self) -> Option<SeasonStartDates> {
        let result = self
            .cached("season_start_dates".to_string(), || {
                self.api.season_start_dates()
            })
            .await;
        Self::degrade("season start dates", result)
    }

    pub async fn player(&self, slug: &str) -> Lookup<Player> {
        let result = self
            .cached(format!("player:{}", slug), || self.api.player(slug))
            .await;
        Self::lookup(&format!("player {}", slug), result)
    }

    pub async fn team(&self, slug: &str) -> Lookup<Team> {
        let result = self
            .cached(format!("team:{}", slug), || self.api.team(slug))
            .await;
        Self::lookup(&format!("team {}", slug), result)
    }

    pub async fn pitching_stats(
        &self,
        kind: TargetKind,
        id: &str,
        stat_type: StatType,
        postseason: bool,
    ) -> Option<PlayerStats> {
        let key = format!(
            "pitching:{}:{}:{}:{}",
            kind.path(),
            id,
            stat_type.as_str(),
            postseason
        );
        let result = self
            .cached(key, || self.api.pitching_stats(kind, id, stat_type, postseason))
            .await;
        Self::degrade(&format!("{} {} pitching stats", kind.path(), id), result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_upstream::FakeUpstream;

    fn cache(upstream: &FakeUpstream) -> StatsCache {
        StatsCache::new(upstream.api(), Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_success_is_served_from_cache() {
        let upstream = FakeUpstream::spawn().await;
        let stats = cache(&upstream);

        let first = stats.players().await.unwrap();
        let second = stats.players().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].player_name, "York Silk");
        assert_eq!(upstream.hits(), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let upstream = FakeUpstream::spawn().await;
        let stats = cache(&upstream);

        upstream.set_online(false);
        assert_eq!(stats.players().await, None);
        assert_eq!(upstream.hits(), 1);

        upstream.set_online(true);
        assert_eq!(stats.players().await.map(|p| p.len()), Some(1));
        assert_eq!(upstream.hits(), 2);

        // Recovered value is cached like any other success
        upstream.set_online(false);
        assert_eq!(stats.players().await.map(|p| p.len()), Some(1));
        assert_eq!(upstream.hits(), 2);
    }

    #[tokio::test]
    async fn test_lookup_distinguishes_missing_from_unavailable() {
        let upstream = FakeUpstream::spawn().await;
        let stats = cache(&upstream);

        match stats.player("york-silk").await {
            Lookup::Found(player) => assert_eq!(player.player_id, "p-york"),
            other => panic!("expected Found, got {:?}", other),
        }
        assert_eq!(stats.player("nobody").await, Lookup::NotFound);
        assert_eq!(stats.team("nobody").await, Lookup::NotFound);

        upstream.set_online(false);
        assert_eq!(stats.player("someone-else").await, Lookup::Unavailable);
        // Already cached before the outage
        assert!(matches!(stats.player("york-silk").await, Lookup::Found(_)));
    }

    #[tokio::test]
    async fn test_pitching_stats_cached_per_stat_type() {
        let upstream = FakeUpstream::spawn().await;
        let stats = cache(&upstream);

        let season = stats
            .pitching_stats(TargetKind::Player, "p-york", StatType::Season, false)
            .await
            .unwrap();
        assert_eq!(season.splits[0].season, Some(3));

        stats
            .pitching_stats(TargetKind::Player, "p-york", StatType::Career, false)
            .await
            .unwrap();
        stats
            .pitching_stats(TargetKind::Player, "p-york", StatType::Season, false)
            .await
            .unwrap();
        assert_eq!(upstream.hits(), 2);
    }

    #[test]
    fn test_lookup_map() {
        assert_eq!(Lookup::Found(2).map(|n| n * 10), Lookup::Found(20));
        assert_eq!(Lookup::<i32>::NotFound.map(|n| n * 10), Lookup::NotFound);
        assert_eq!(Lookup::<i32>::Unavailable.map(|n| n * 10), Lookup::Unavailable);
    }
}
