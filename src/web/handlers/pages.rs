// Page handlers for HTML rendering with Askama

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::Html,
};

use crate::api_server::{AppError, AppState};
use crate::home::{incinerations, recent_debuts, upcoming_season_starts, RECENT_DEBUT_COUNT};
use crate::model::Player;
use crate::search::Attribution;
use crate::stats_api::TargetKind;
use crate::stats_cache::Lookup;
use crate::web::stat_tables::{build_view, load_pitching, QueryParams, StatTableView, PITCHING_TABLES};

// ============================================================================
// Layout
// ============================================================================

/// Fields every page passes to `base.html`
pub struct Layout {
    /// Typeahead session; scopes last-issued-wins to one browser page
    pub session: String,
    pub search_term: String,
    pub on_search_page: bool,
    /// Shown while suggestions load, alongside the placeholder
    pub attribution: Option<Attribution>,
}

impl Layout {
    pub fn new(attribution: Option<Attribution>) -> Self {
        Self {
            session: new_session_id(),
            search_term: String::new(),
            on_search_page: false,
            attribution,
        }
    }

    pub fn search_page(
        search_term: &str,
        session: Option<&str>,
        attribution: Option<Attribution>,
    ) -> Self {
        Self {
            session: session
                .filter(|s| !s.is_empty())
                .map_or_else(new_session_id, str::to_string),
            search_term: search_term.to_string(),
            on_search_page: true,
            attribution,
        }
    }
}

fn new_session_id() -> String {
    format!("{:016x}", rand::random::<u64>())
}

pub struct PlayerLink {
    pub name: String,
    pub href: String,
}

impl From<&Player> for PlayerLink {
    fn from(player: &Player) -> Self {
        Self {
            name: player.player_name.clone(),
            href: format!("/players/{}", player.url_slug),
        }
    }
}

// ============================================================================
// Home Page
// ============================================================================

pub struct UpcomingDate {
    pub label: String,
    pub date: String,
}

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub title: String,
    pub upcoming: Vec<UpcomingDate>,
    pub recent_debuts: Vec<PlayerLink>,
    pub in_memoriam: Vec<PlayerLink>,
}

pub async fn home_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let (players, dates) = tokio::join!(state.stats.players(), state.stats.season_start_dates());
    let players = players.unwrap_or_default();

    let upcoming = dates
        .map(|dates| upcoming_season_starts(&dates, chrono::Utc::now()))
        .unwrap_or_default()
        .into_iter()
        .map(|start| UpcomingDate {
            date: start.display_date(),
            label: format!("Season {}", start.season),
        })
        .collect();

    let template = HomeTemplate {
        layout: Layout::new(state.search.attribution()),
        title: "Blaseball Stats, Scores, History, and More - Blaseball-Reference.com".to_string(),
        upcoming,
        recent_debuts: recent_debuts(&players, RECENT_DEBUT_COUNT)
            .into_iter()
            .map(PlayerLink::from)
            .collect(),
        in_memoriam: incinerations(&players).into_iter().map(PlayerLink::from).collect(),
    };

    Ok(Html(template.render()?))
}

// ============================================================================
// Player / Team Pages
// ============================================================================

#[derive(Template)]
#[template(path = "pages/stat_page.html")]
pub struct StatPageTemplate {
    pub layout: Layout,
    pub title: String,
    pub name: String,
    pub kind_label: &'static str,
    pub tables: Vec<StatTableView>,
}

/// Id and display name for a page's stat target
pub struct StatTarget {
    pub kind: TargetKind,
    pub id: String,
    pub name: String,
}

/// Resolves a slug; Ok(None) means the upstream is unavailable
pub async fn resolve_target(
    state: &AppState,
    kind: TargetKind,
    slug: &str,
) -> Result<Option<StatTarget>, AppError> {
    let lookup = match kind {
        TargetKind::Player => state
            .stats
            .player(slug)
            .await
            .map(|p| (p.player_id, p.player_name)),
        TargetKind::Team => state
            .stats
            .team(slug)
            .await
            .map(|t| (t.team_id.clone(), t.display_name().to_string())),
    };

    match lookup {
        Lookup::Found((id, name)) => Ok(Some(StatTarget { kind, id, name })),
        Lookup::NotFound => Err(AppError::NotFound(format!(
            "No {} found for '{}'",
            kind_label(kind).to_lowercase(),
            slug
        ))),
        Lookup::Unavailable => Ok(None),
    }
}

fn kind_label(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Player => "Player",
        TargetKind::Team => "Team",
    }
}

async fn stat_page(
    state: &AppState,
    kind: TargetKind,
    slug: &str,
    params: &QueryParams,
) -> Result<Html<String>, AppError> {
    let base_path = format!("/{}/{}", kind.path(), slug);
    let mut tables = Vec::new();

    // Upstream failures are logged by the cache and render as "no stats"
    let name = match resolve_target(state, kind, slug).await? {
        Some(target) => {
            for spec in &PITCHING_TABLES {
                if let Some(data) =
                    load_pitching(&state.stats, target.kind, &target.id, spec.postseason).await
                {
                    if !data.splits.is_empty() {
                        tables.push(build_view(spec, &data, &base_path, params)?);
                    }
                }
            }
            target.name
        }
        None => slug.to_string(),
    };

    let template = StatPageTemplate {
        layout: Layout::new(state.search.attribution()),
        title: format!("{} Stats - Blaseball-Reference.com", name),
        name,
        kind_label: kind_label(kind),
        tables,
    };

    Ok(Html(template.render()?))
}

pub async fn player_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<Html<String>, AppError> {
    stat_page(&state, TargetKind::Player, &slug, &params).await
}

pub async fn team_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<Html<String>, AppError> {
    stat_page(&state, TargetKind::Team, &slug, &params).await
}
