//! FST-based Search Index for Player and Team Lookup
//!
//! In-process fallback for the hosted index. Indexes:
//! - Full player names and team names (nickname and full name)
//! - Individual name words of 3+ characters ("silk" matches "York Silk")
//!
//! Prefix search first, then a one-edit fuzzy pass when prefix matches are
//! sparse.

use async_trait::async_trait;
use fst::automaton::Levenshtein;
use fst::{Automaton, IntoStreamer, Map, MapBuilder, Streamer};
use rustc_hash::{FxHashMap, FxHashSet};

use super::{SearchBackend, SearchError, SearchRecord};
use crate::model::{Player, Team};

pub const DEFAULT_LIMIT: usize = 10;

pub struct SearchIndex {
    /// Normalized term -> first record index (FST keys must be unique)
    fst_map: Map<Vec<u8>>,
    records: Vec<SearchRecord>,
    /// Term -> every record carrying it
    term_to_indices: FxHashMap<String, Vec<usize>>,
    limit: usize,
}

impl SearchIndex {
    pub fn build(players: &[Player], teams: &[Team]) -> Result<Self, SearchError> {
        let start = std::time::Instant::now();

        let mut records: Vec<SearchRecord> = Vec::new();
        let mut search_terms: Vec<(String, usize)> = Vec::new();

        for player in players {
            if player.player_name.trim().is_empty() || player.url_slug.is_empty() {
                continue;
            }
            let idx = records.len();
            push_terms(&mut search_terms, &player.player_name, idx);
            records.push(SearchRecord {
                object_id: player.player_id.clone(),
                title: player.player_name.clone(),
                record_type: "players".to_string(),
                anchor: format!("/players/{}", player.url_slug),
            });
        }

        for team in teams {
            let title = team.display_name().to_string();
            if title.trim().is_empty() || team.url_slug.is_empty() {
                continue;
            }
            let idx = records.len();
            push_terms(&mut search_terms, &title, idx);
            if team.nickname != title {
                push_terms(&mut search_terms, &team.nickname, idx);
            }
            records.push(SearchRecord {
                object_id: team.team_id.clone(),
                title,
                record_type: "teams".to_string(),
                anchor: format!("/teams/{}", team.url_slug),
            });
        }

        // FST requires lexicographically sorted keys
        search_terms.sort();

        let mut term_to_indices: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (term, idx) in &search_terms {
            let indices = term_to_indices.entry(term.clone()).or_default();
            if !indices.contains(idx) {
                indices.push(*idx);
            }
        }

        let mut builder = MapBuilder::memory();
        let mut last_term: Option<&str> = None;
        for (term, idx) in &search_terms {
            if last_term == Some(term.as_str()) {
                continue;
            }
            builder.insert(term.as_bytes(), *idx as u64)?;
            last_term = Some(term.as_str());
        }
        let fst_map = Map::new(builder.into_inner()?)?;

        tracing::info!(
            "Search index built in {:?} ({} records, {} unique terms)",
            start.elapsed(),
            records.len(),
            term_to_indices.len()
        );

        Ok(Self {
            fst_map,
            records,
            term_to_indices,
            limit: DEFAULT_LIMIT,
        })
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Prefix search (fast, for typeahead)
    pub fn search_prefix(&self, query: &str, limit: usize) -> Vec<&SearchRecord> {
        let query = normalize(query);
        if query.is_empty() {
            return vec![];
        }

        let prefix = fst::automaton::Str::new(&query).starts_with();
        self.collect(self.fst_map.search(prefix).into_stream(), limit)
    }

    /// Fuzzy search (allows typos)
    pub fn search_fuzzy(&self, query: &str, max_distance: u32, limit: usize) -> Vec<&SearchRecord> {
        let query = normalize(query);
        if query.is_empty() {
            return vec![];
        }

        let lev = match Levenshtein::new(&query, max_distance) {
            Ok(l) => l,
            Err(e) => {
                tracing::debug!("Levenshtein automaton unavailable for '{}': {}", query, e);
                return self.search_prefix(&query, limit);
            }
        };
        self.collect(self.fst_map.search(lev).into_stream(), limit)
    }

    /// Combined search: prefix first, then fuzzy if few results
    pub fn search(&self, query: &str, limit: usize) -> Vec<&SearchRecord> {
        let prefix_results = self.search_prefix(query, limit);

        if prefix_results.len() >= limit / 2 {
            return prefix_results;
        }

        if query.chars().count() >= 3 {
            let fuzzy_results = self.search_fuzzy(query, 1, limit);
            if fuzzy_results.len() > prefix_results.len() {
                return fuzzy_results;
            }
        }

        prefix_results
    }

    fn collect<'a, S>(&'a self, mut stream: S, limit: usize) -> Vec<&'a SearchRecord>
    where
        S: for<'s> Streamer<'s, Item = (&'s [u8], u64)>,
    {
        let mut seen: FxHashSet<usize> = FxHashSet::default();
        let mut results: Vec<&SearchRecord> = Vec::new();

        while let Some((term, _)) = stream.next() {
            let Ok(term) = std::str::from_utf8(term) else {
                continue;
            };
            let Some(indices) = self.term_to_indices.get(term) else {
                continue;
            };
            for &idx in indices {
                if idx < self.records.len() && seen.insert(idx) {
                    results.push(&self.records[idx]);
                    if results.len() >= limit {
                        return results;
                    }
                }
            }
        }

        results
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn push_terms(terms: &mut Vec<(String, usize)>, title: &str, idx: usize) {
    let full = normalize(title);
    if full.is_empty() {
        return;
    }

    for word in full.split_whitespace() {
        if word.chars().count() >= 3 && word != full {
            terms.push((word.to_string(), idx));
        }
    }
    terms.push((full, idx));
}

#[async_trait]
impl SearchBackend for SearchIndex {
    async fn search(&self, query: &str) -> Result<Vec<SearchRecord>, SearchError> {
        Ok(SearchIndex::search(self, query, self.limit)
            .into_iter()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, name: &str, slug: &str) -> Player {
        Player {
            player_id: id.to_string(),
            player_name: name.to_string(),
            url_slug: slug.to_string(),
            ..Default::default()
        }
    }

    fn index() -> SearchIndex {
        let players = vec![
            player("p1", "York Silk", "york-silk"),
            player("p2", "Jessica Telephone", "jessica-telephone"),
            player("p3", "Silvaire Roadhouse", "silvaire-roadhouse"),
            player("p4", "", "nameless"),
        ];
        let teams = vec![Team {
            team_id: "t1".to_string(),
            url_slug: "hades-tigers".to_string(),
            nickname: "Tigers".to_string(),
            full_name: "Hades Tigers".to_string(),
        }];
        SearchIndex::build(&players, &teams).unwrap()
    }

    #[test]
    fn test_prefix_matches_words_and_full_names() {
        let index = index();
        assert_eq!(index.len(), 4);

        let titles: Vec<&str> = index
            .search_prefix("sil", 10)
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(titles, vec!["York Silk", "Silvaire Roadhouse"]);

        let hits = index.search_prefix("TIG", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].record_type, "teams");
        assert_eq!(hits[0].anchor, "/teams/hades-tigers");
    }

    #[test]
    fn test_fuzzy_fallback_for_typos() {
        let index = index();
        assert!(index.search_prefix("telephome", 10).is_empty());

        let hits = index.search("telephome", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Jessica Telephone");
    }

    #[test]
    fn test_limit_and_empty_query() {
        let index = index();
        assert!(index.search("", 10).is_empty());
        assert_eq!(index.search_prefix("s", 1).len(), 1);
    }

    #[tokio::test]
    async fn test_backend_uses_configured_limit() {
        let index = index().with_limit(1);
        let hits = SearchBackend::search(&index, "s").await.unwrap();
        assert_eq!(hits.len(), 1);
    }
}
