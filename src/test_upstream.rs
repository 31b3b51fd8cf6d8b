//! In-process stand-in for the stats API, for unit tests
//!
//! Counts every request it receives and can be switched offline, in which
//! case it answers 500 to everything.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::Config;
use crate::stats_api::StatsApi;

#[derive(Clone)]
pub struct FakeUpstream {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    online: Arc<AtomicBool>,
    players: Arc<Mutex<Value>>,
}

impl FakeUpstream {
    pub async fn spawn() -> Self {
        let upstream = Self {
            addr: ([127, 0, 0, 1], 0).into(),
            hits: Arc::new(AtomicUsize::new(0)),
            online: Arc::new(AtomicBool::new(true)),
            players: Arc::new(Mutex::new(json!([
                { "player_id": "p-york", "player_name": "York Silk", "url_slug": "york-silk" }
            ]))),
        };

        let router = Router::new()
            .route("/players", get(player_list))
            .route("/players/:key", get(player_by_slug))
            .route("/players/:key/stats", get(stats))
            .route("/teams", get(|| async { Json(json!([])) }))
            .route("/teams/:key", get(|| async { StatusCode::NOT_FOUND }))
            .layer(middleware::from_fn_with_state(upstream.clone(), gate))
            .with_state(upstream.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { addr, ..upstream }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn set_players(&self, players: Value) {
        *self.players.lock().unwrap() = players;
    }

    pub fn config(&self) -> Config {
        let base = format!("http://{}", self.addr);
        Config {
            api_url: base.clone(),
            db_api_url: base,
            http_timeout: Duration::from_secs(2),
            ..Config::default()
        }
    }

    pub fn api(&self) -> StatsApi {
        let config = self.config();
        StatsApi::new(&config, StatsApi::http_client(&config).unwrap())
    }
}

async fn gate(State(upstream): State<FakeUpstream>, request: Request<Body>, next: Next) -> Response {
    upstream.hits.fetch_add(1, Ordering::SeqCst);
    if !upstream.online.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    next.run(request).await
}

async fn player_list(State(upstream): State<FakeUpstream>) -> Json<Value> {
    Json(upstream.players.lock().unwrap().clone())
}

async fn player_by_slug(State(upstream): State<FakeUpstream>, Path(slug): Path<String>) -> Response {
    let players = upstream.players.lock().unwrap().clone();
    let found = players
        .as_array()
        .and_then(|list| list.iter().find(|p| p["url_slug"] == slug.as_str()).cloned());
    match found {
        Some(player) => Json(player).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn stats(Path(_id): Path<String>) -> Json<Value> {
    Json(json!({ "splits": [ { "season": 3, "stat": { "wins": 7 } } ] }))
}
