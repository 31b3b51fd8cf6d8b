//! Search: result types, backends and the typeahead client
//!
//! - `hosted`: hosted search index over HTTP
//! - `index`: in-process FST index over player and team names
//! - `local`: the FST index, rebuilt from the stats cache on an interval
//! - `typeahead`: debounced, last-issued-wins query client

pub mod hosted;
pub mod index;
#[cfg(feature = "api")]
pub mod local;
pub mod typeahead;

pub use hosted::HostedSearch;
pub use index::SearchIndex;
#[cfg(feature = "api")]
pub use local::LocalSearch;
pub use typeahead::{Navigation, Phase, QueryTicket, TypeaheadClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("search index returned status {0}")]
    Status(u16),

    #[error("search index build failed: {0}")]
    Index(#[from] fst::Error),
}

/// Record shape shared by the hosted index and the local one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    #[serde(rename = "objectID", default)]
    pub object_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub record_type: String,
    /// Site path of the record's page
    #[serde(default)]
    pub anchor: String,
}

/// A selectable option. The navigation target travels with the option, so
/// selecting it never needs a secondary lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub record_type: String,
    pub navigation_target: Option<String>,
}

impl From<SearchRecord> for SearchResult {
    fn from(record: SearchRecord) -> Self {
        let navigation_target = navigation_target(&record.record_type, &record.anchor);
        Self {
            id: record.object_id,
            title: record.title,
            record_type: record.record_type,
            navigation_target,
        }
    }
}

/// Only players and teams have pages to navigate to. Path anchors must name
/// a single page in the record's own section; bare slugs are encoded into it.
pub fn navigation_target(record_type: &str, anchor: &str) -> Option<String> {
    let anchor = anchor.trim();
    if anchor.is_empty() {
        return None;
    }

    let section = match record_type {
        "players" => "/players/",
        "teams" => "/teams/",
        _ => return None,
    };

    if anchor.starts_with('/') {
        let slug = anchor.strip_prefix(section)?;
        let single_segment = !slug.is_empty()
            && slug != "."
            && slug != ".."
            && !slug.contains(|c: char| {
                c == '/' || c == '\\' || c.is_whitespace() || c.is_control()
            });
        single_segment.then(|| anchor.to_string())
    } else {
        Some(format!("{}{}", section, urlencoding::encode(anchor)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResultGroup {
    pub record_type: String,
    pub results: Vec<SearchResult>,
}

/// Results keyed by record type, groups in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResultGroups {
    groups: Vec<SearchResultGroup>,
}

impl SearchResultGroups {
    pub fn from_records(records: impl IntoIterator<Item = SearchRecord>) -> Self {
        let mut groups: Vec<SearchResultGroup> = Vec::new();

        for record in records {
            let result = SearchResult::from(record);
            match groups.iter_mut().find(|g| g.record_type == result.record_type) {
                Some(group) => group.results.push(result),
                None => groups.push(SearchResultGroup {
                    record_type: result.record_type.clone(),
                    results: vec![result],
                }),
            }
        }

        Self { groups }
    }

    pub fn groups(&self) -> &[SearchResultGroup] {
        &self.groups
    }

    pub fn group(&self, record_type: &str) -> Option<&SearchResultGroup> {
        self.groups.iter().find(|g| g.record_type == record_type)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn result_count(&self) -> usize {
        self.groups.iter().map(|g| g.results.len()).sum()
    }
}

/// Link shown next to results, required by the hosted provider's terms
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
    pub label: &'static str,
    pub href: &'static str,
    pub logo: &'static str,
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchRecord>, SearchError>;

    fn attribution(&self) -> Option<Attribution> {
        None
    }
}
