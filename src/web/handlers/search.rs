// Search page and typeahead suggestion handlers

use askama::Template;
use axum::{
    extract::{Query, State},
    http::{header::HeaderName, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
};
use axum_htmx::HxRequest;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::api_server::{AppError, AppState};
use crate::search::typeahead::search_destination;
use crate::search::{Attribution, Navigation, SearchResultGroups, TypeaheadClient};
use crate::web::handlers::pages::Layout;

const HX_PUSH_URL: HeaderName = HeaderName::from_static("hx-push-url");
const HX_RESWAP: HeaderName = HeaderName::from_static("hx-reswap");

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(rename = "searchTerm", default)]
    pub search_term: String,
    /// Typeahead session of the page that issued the request
    #[serde(default)]
    pub session: Option<String>,
}

impl SearchQuery {
    fn session(&self) -> Option<&str> {
        self.session.as_deref().filter(|s| !s.is_empty())
    }
}

// ============================================================================
// Result views
// ============================================================================

pub struct ResultView {
    pub title: String,
    /// None renders as plain text: the option has nowhere to go
    pub href: Option<String>,
}

pub struct ResultGroupView {
    pub heading: String,
    pub results: Vec<ResultView>,
}

fn group_heading(record_type: &str) -> String {
    let mut chars = record_type.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Other".to_string(),
    }
}

fn group_views(groups: &SearchResultGroups) -> Vec<ResultGroupView> {
    groups
        .groups()
        .iter()
        .map(|group| ResultGroupView {
            heading: group_heading(&group.record_type),
            results: group
                .results
                .iter()
                .map(|result| ResultView {
                    title: result.title.clone(),
                    href: result.navigation_target.clone(),
                })
                .collect(),
        })
        .collect()
}

// ============================================================================
// Search page
// ============================================================================

#[derive(Template)]
#[template(path = "pages/search.html")]
pub struct SearchPageTemplate {
    pub layout: Layout,
    pub title: String,
    pub results: SearchResultsTemplate,
}

#[derive(Template)]
#[template(path = "partials/search_results.html")]
pub struct SearchResultsTemplate {
    pub search_term: String,
    pub groups: Vec<ResultGroupView>,
    pub result_count: usize,
    pub attribution: Option<Attribution>,
}

async fn run_search(state: &AppState, term: &str) -> SearchResultsTemplate {
    let mut results = SearchResultsTemplate {
        search_term: term.to_string(),
        groups: Vec::new(),
        result_count: 0,
        attribution: state.search.attribution(),
    };

    if term.trim().is_empty() {
        return results;
    }

    match state.search.search(term).await {
        Ok(records) => {
            let groups = SearchResultGroups::from_records(records);
            results.result_count = groups.result_count();
            results.groups = group_views(&groups);
        }
        // Reads as no results; the failure only goes to the log
        Err(e) => tracing::warn!("Search for '{}' failed: {}", term, e),
    }
    results
}

/// GET /search?searchTerm=...
///
/// A plain request renders the whole page. An htmx submit from the search
/// page itself swaps only the results and pushes the new URL.
pub async fn search_page(
    State(state): State<AppState>,
    HxRequest(is_htmx): HxRequest,
    Query(query): Query<SearchQuery>,
) -> Result<Response, AppError> {
    let term = query.search_term.as_str();

    let navigation = match query.session() {
        Some(session) => state.typeahead(session).await.submit(term, is_htmx),
        None => Navigation {
            target: search_destination(term),
            in_place: is_htmx,
        },
    };

    let results = run_search(&state, term).await;

    if navigation.in_place {
        let body = results.render()?;
        let mut response = Html(body).into_response();
        if let Ok(url) = HeaderValue::from_str(&navigation.target) {
            response.headers_mut().insert(HX_PUSH_URL, url);
        }
        return Ok(response);
    }

    let title = if term.is_empty() {
        "Search - Blaseball-Reference.com".to_string()
    } else {
        format!("Search Results for \"{}\" - Blaseball-Reference.com", term)
    };

    let template = SearchPageTemplate {
        layout: Layout::search_page(term, query.session(), state.search.attribution()),
        title,
        results,
    };
    Ok(Html(template.render()?).into_response())
}

// ============================================================================
// Typeahead suggestions
// ============================================================================

#[derive(Template)]
#[template(path = "partials/suggestions.html")]
pub struct SuggestionsTemplate {
    pub groups: Vec<ResultGroupView>,
    pub attribution: Option<Attribution>,
}

/// GET /search/suggest?searchTerm=...&session=...
///
/// - short input: 200 with an empty body, clearing the dropdown
/// - superseded by a newer keystroke: 204 with `HX-Reswap: none`
/// - otherwise: the grouped suggestion list
pub async fn suggest(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, AppError> {
    let client = match query.session() {
        Some(session) => state.typeahead(session).await,
        None => Arc::new(TypeaheadClient::new(state.search.clone(), Duration::ZERO)),
    };

    let Some(ticket) = client.input(&query.search_term) else {
        return Ok(Html(String::new()).into_response());
    };

    let Some(groups) = client.resolve(ticket).await else {
        let mut response = StatusCode::NO_CONTENT.into_response();
        response
            .headers_mut()
            .insert(HX_RESWAP, HeaderValue::from_static("none"));
        return Ok(response);
    };

    if groups.is_empty() {
        return Ok(Html(String::new()).into_response());
    }

    let template = SuggestionsTemplate {
        groups: group_views(&groups),
        attribution: state.search.attribution(),
    };
    Ok(Html(template.render()?).into_response())
}
