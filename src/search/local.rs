//! Local Search - FST index kept fresh from the stats cache
//!
//! Used when no hosted index is configured. The index is rebuilt from the
//! cached player and team lists once per revalidation interval. A build that
//! comes back empty is served but not kept, so the next query tries again.

use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use super::{SearchBackend, SearchError, SearchIndex, SearchRecord};
use crate::stats_cache::StatsCache;

pub struct LocalSearch {
    stats: Arc<StatsCache>,
    index: Cache<(), Arc<SearchIndex>>,
    limit: usize,
}

impl LocalSearch {
    pub fn new(stats: Arc<StatsCache>, revalidate: Duration, limit: usize) -> Self {
        let index = Cache::builder()
            .max_capacity(1)
            .time_to_live(revalidate)
            .build();
        Self { stats, index, limit }
    }

    /// Current index, rebuilding it when expired or never loaded
    pub async fn index(&self) -> Result<Arc<SearchIndex>, SearchError> {
        if let Some(index) = self.index.get(&()).await {
            return Ok(index);
        }

        let (players, teams) = tokio::join!(self.stats.players(), self.stats.teams());
        let players = players.unwrap_or_default();
        let teams = teams.unwrap_or_default();

        let index = Arc::new(SearchIndex::build(&players, &teams)?.with_limit(self.limit));
        if index.is_empty() {
            tracing::warn!("Local search index is empty (no players or teams loaded), will retry");
        } else {
            self.index.insert((), index.clone()).await;
        }
        Ok(index)
    }
}

#[async_trait]
impl SearchBackend for LocalSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchRecord>, SearchError> {
        let index = self.index().await?;
        SearchBackend::search(index.as_ref(), query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_upstream::FakeUpstream;
    use serde_json::json;

    fn titles(records: &[SearchRecord]) -> Vec<&str> {
        records.iter().map(|r| r.title.as_str()).collect()
    }

    fn local_search(upstream: &FakeUpstream, revalidate: Duration) -> LocalSearch {
        let stats = Arc::new(StatsCache::new(upstream.api(), revalidate));
        LocalSearch::new(stats, revalidate, 10)
    }

    #[tokio::test]
    async fn test_empty_index_is_retried_after_outage() {
        let upstream = FakeUpstream::spawn().await;
        upstream.set_online(false);
        let search = local_search(&upstream, Duration::from_secs(3600));

        assert!(search.search("york").await.unwrap().is_empty());

        upstream.set_online(true);
        let records = search.search("york").await.unwrap();
        assert_eq!(titles(&records), vec!["York Silk"]);
        assert_eq!(records[0].anchor, "/players/york-silk");
    }

    #[tokio::test]
    async fn test_loaded_index_is_reused_within_interval() {
        let upstream = FakeUpstream::spawn().await;
        let search = local_search(&upstream, Duration::from_secs(3600));

        assert_eq!(titles(&search.search("york").await.unwrap()), vec!["York Silk"]);
        let hits = upstream.hits();

        assert_eq!(titles(&search.search("silk").await.unwrap()), vec!["York Silk"]);
        assert_eq!(upstream.hits(), hits);
    }

    #[tokio::test]
    async fn test_index_picks_up_new_players_after_interval() {
        let upstream = FakeUpstream::spawn().await;
        let search = local_search(&upstream, Duration::from_millis(200));

        assert!(search.search("nagomi").await.unwrap().is_empty());

        upstream.set_players(json!([
            { "player_id": "p-york", "player_name": "York Silk", "url_slug": "york-silk" },
            { "player_id": "p-nagomi", "player_name": "Nagomi McDaniel", "url_slug": "nagomi-mcdaniel" }
        ]));
        tokio::time::sleep(Duration::from_millis(400)).await;

        let records = search.search("nagomi").await.unwrap();
        assert_eq!(titles(&records), vec!["Nagomi McDaniel"]);
    }
}
