//! HTTP surface: routing, shared state and handlers.

pub mod error;
pub mod handlers;

pub use error::{ApiError, Endpoint, ErrorBody};

use std::sync::Arc;

use axum::handler::HandlerWithoutStateExt;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::assets::ThemeStore;
use crate::config::Config;
use crate::github::GithubClient;

/// One documented endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

/// Every public endpoint, in the order they are logged at start-up.
pub const ROUTES: &[RouteInfo] = &[
    RouteInfo {
        method: "GET",
        path: "/api/health",
        description: "Health check",
    },
    RouteInfo {
        method: "GET",
        path: "/api/themes",
        description: "List available themes",
    },
    RouteInfo {
        method: "GET",
        path: "/api/framed-avatar/:identifier",
        description: "Generate framed avatar",
    },
    RouteInfo {
        method: "GET",
        path: "/api/frames",
        description: "Framed avatar with fallback image",
    },
    RouteInfo {
        method: "GET",
        path: "/api/smart-frame/:identifier",
        description: "Profile-based frame suggestions",
    },
    RouteInfo {
        method: "GET",
        path: "/api/badge/:identifier",
        description: "GitHub stats badge links",
    },
];

/// State shared by every handler. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: ThemeStore,
    pub github: GithubClient,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let github = GithubClient::new(
            config.avatar_base_url.clone(),
            config.api_base_url.clone(),
            config.api_timeout(),
        )?;
        Ok(Self {
            store: ThemeStore::new(config.asset_root.clone()),
            github,
            config: Arc::new(config),
        })
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/themes", get(handlers::themes))
        .route("/framed-avatar/:identifier", get(handlers::framed_avatar))
        .route("/frames", get(handlers::frames))
        .route("/smart-frame/:identifier", get(handlers::smart_frame))
        .route("/badge/:identifier", get(handlers::badge))
        .fallback(handlers::api_not_found);

    let index = state.store.index_path();
    let spa = move || handlers::spa_index(index.clone());
    let static_files = ServeDir::new(state.store.root()).fallback(spa.into_service());

    Router::new()
        .nest("/api", api)
        .fallback_service(static_files)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
