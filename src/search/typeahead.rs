//! Typeahead Search Client
//!
//! State machine: `Idle -> Querying -> Idle`. Every input bumps a sequence
//! number; only the response to the latest issued query may update the
//! results. Superseded requests are not cancelled, their responses are
//! dropped on arrival.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::{SearchBackend, SearchResultGroups};

/// Shorter inputs never reach the search backend
pub const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Querying,
}

/// Handle for one issued query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTicket {
    seq: u64,
}

impl QueryTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Where a submit or selection sends the browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub target: String,
    /// Already on the destination view: update in place, no full reload
    pub in_place: bool,
}

pub const SEARCH_PATH: &str = "/search";

pub fn search_destination(raw_query: &str) -> String {
    format!("{}?searchTerm={}", SEARCH_PATH, urlencoding::encode(raw_query))
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeaheadSnapshot {
    pub phase: Phase,
    pub query: String,
    pub results: SearchResultGroups,
}

impl TypeaheadSnapshot {
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Querying
    }
}

struct State {
    latest: u64,
    phase: Phase,
    query: String,
    results: SearchResultGroups,
}

pub struct TypeaheadClient {
    backend: Arc<dyn SearchBackend>,
    debounce: Duration,
    state: Mutex<State>,
}

impl TypeaheadClient {
    pub fn new(backend: Arc<dyn SearchBackend>, debounce: Duration) -> Self {
        Self {
            backend,
            debounce,
            state: Mutex::new(State {
                latest: 0,
                phase: Phase::Idle,
                query: String::new(),
                results: SearchResultGroups::default(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // State stays consistent across a panic in another holder
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records a keystroke. Returns a ticket when the input is long enough
    /// to query; shorter input clears results and returns to Idle.
    pub fn input(&self, text: &str) -> Option<QueryTicket> {
        let mut state = self.state();
        state.latest += 1;

        if text.chars().count() < MIN_QUERY_CHARS {
            state.phase = Phase::Idle;
            state.query.clear();
            state.results = SearchResultGroups::default();
            return None;
        }

        state.phase = Phase::Querying;
        state.query = text.to_string();
        Some(QueryTicket { seq: state.latest })
    }

    pub fn is_latest(&self, ticket: QueryTicket) -> bool {
        self.state().latest == ticket.seq
    }

    /// Waits out the debounce, queries the backend and applies the response.
    /// Returns None when a newer input superseded this ticket, either before
    /// dispatch (no request is made) or while the request was in flight.
    pub async fn resolve(&self, ticket: QueryTicket) -> Option<SearchResultGroups> {
        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }

        let query = {
            let state = self.state();
            if state.latest != ticket.seq {
                tracing::debug!("Typeahead query #{} superseded before dispatch", ticket.seq);
                return None;
            }
            state.query.clone()
        };

        let outcome = self.backend.search(&query).await;

        let mut state = self.state();
        if state.latest != ticket.seq {
            tracing::debug!(
                "Discarding stale typeahead response #{} for '{}' (latest #{})",
                ticket.seq,
                query,
                state.latest
            );
            return None;
        }

        state.phase = Phase::Idle;
        state.results = match outcome {
            Ok(records) => SearchResultGroups::from_records(records),
            Err(e) => {
                tracing::warn!("Typeahead search for '{}' failed: {}", query, e);
                SearchResultGroups::default()
            }
        };
        Some(state.results.clone())
    }

    /// `input` then `resolve`. Short input yields empty results directly.
    pub async fn search(&self, text: &str) -> Option<SearchResultGroups> {
        match self.input(text) {
            Some(ticket) => self.resolve(ticket).await,
            None => Some(SearchResultGroups::default()),
        }
    }

    /// Explicit form submit. Never calls the backend: pending queries are
    /// superseded and the search page runs the search itself.
    pub fn submit(&self, text: &str, on_search_page: bool) -> Navigation {
        let mut state = self.state();
        state.latest += 1;
        state.phase = Phase::Idle;
        state.query.clear();
        state.results = SearchResultGroups::default();

        Navigation {
            target: search_destination(text),
            in_place: on_search_page,
        }
    }

    pub fn snapshot(&self) -> TypeaheadSnapshot {
        let state = self.state();
        TypeaheadSnapshot {
            phase: state.phase,
            query: state.query.clone(),
            results: state.results.clone(),
        }
    }
}
