// Axum Web Server Module
//
// Purpose: server-rendered stats site (askama + htmx) over the read-only
// stats API, with typeahead suggestions and CSV downloads

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

use crate::config::Config;
use crate::search::{HostedSearch, LocalSearch, SearchBackend, TypeaheadClient};
use crate::stats_api::StatsApi;
use crate::stats_cache::StatsCache;
use crate::web::handlers::{export, pages, search};

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub stats: Arc<StatsCache>,
    pub search: Arc<dyn SearchBackend>,
    /// One typeahead client per browser page session
    pub typeahead_sessions: Cache<String, Arc<TypeaheadClient>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        tracing::info!("Initializing HTTP client...");
        let http = StatsApi::http_client(&config)?;

        tracing::info!("Initializing stats cache (revalidate every {}s)...", config.revalidate.as_secs());
        let stats = Arc::new(StatsCache::new(
            StatsApi::new(&config, http.clone()),
            config.revalidate,
        ));

        let search: Arc<dyn SearchBackend> = match HostedSearch::from_config(&config.search, http) {
            Some(hosted) => {
                tracing::info!("Using hosted search index at {}", hosted.endpoint());
                Arc::new(hosted)
            }
            None => {
                tracing::info!("Building local search index...");
                let local = LocalSearch::new(
                    stats.clone(),
                    config.revalidate,
                    config.search.hits_per_page,
                );
                local.index().await?;
                Arc::new(local)
            }
        };

        let typeahead_sessions = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(Duration::from_secs(600))
            .build();

        Ok(Self {
            stats,
            search,
            typeahead_sessions,
            config: Arc::new(config),
        })
    }

    pub async fn typeahead(&self, session: &str) -> Arc<TypeaheadClient> {
        let backend = self.search.clone();
        let debounce = self.config.search.debounce;
        self.typeahead_sessions
            .get_with(session.to_string(), async move {
                Arc::new(TypeaheadClient::new(backend, debounce))
            })
            .await
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Pages
        .route("/", get(pages::home_page))
        .route("/players/:slug", get(pages::player_page))
        .route("/teams/:slug", get(pages::team_page))

        // CSV downloads
        .route("/players/:slug/pitching.csv", get(export::player_pitching_csv))
        .route("/teams/:slug/pitching.csv", get(export::team_pitching_csv))

        // Search
        .route("/search", get(search::search_page))
        .route("/search/suggest", get(search::suggest))

        .nest_service("/static", ServeDir::new(static_dir))

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Template(String),
    Internal(String),
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Template(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Template(msg) => {
                tracing::error!("Template error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            message,
        )
            .into_response()
    }
}
