//! Dragon Ball catalog gateway: one JSON endpoint per catalog screen.
//! Upstream data comes from the public API and the first-party backend; the list
//! pipeline and chart layout run here.

pub mod handlers;

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use dashmap::DashMap;
use dbz_catalog_core::{
    BackendClient, CatalogConfig, CatalogResult, ListView, PublicApiClient, SagaCatalog, Screen,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;

/// Shared gateway state. List views are keyed by screen and only mutated through
/// `ListView::apply`.
pub struct AppState {
    pub config: CatalogConfig,
    pub public_api: PublicApiClient,
    pub backend: BackendClient,
    pub sagas: SagaCatalog,
    pub views: DashMap<Screen, ListView>,
}

impl AppState {
    pub fn new(config: CatalogConfig) -> CatalogResult<Self> {
        Ok(Self {
            public_api: PublicApiClient::from_config(&config)?,
            backend: BackendClient::from_config(&config)?,
            sagas: SagaCatalog,
            views: DashMap::new(),
            config,
        })
    }

    pub fn new_view(&self, screen: Screen) -> ListView {
        ListView::new(screen.profile(self.config.page_size))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/characters", get(handlers::list_characters))
        .route(
            "/api/personajes",
            get(handlers::list_personajes).post(handlers::create_personaje),
        )
        .route("/api/personajes/compare", get(handlers::compare_personajes))
        .route(
            "/api/personajes/:id",
            get(handlers::get_personaje)
                .patch(handlers::update_personaje)
                .delete(handlers::delete_personaje),
        )
        .route("/api/sagas", get(handlers::list_sagas))
        .route("/api/sagas/paged", get(handlers::paged_sagas))
        .route("/api/sagas/:id", get(handlers::get_saga))
        .route("/api/transformations", get(handlers::list_transformations))
        .route("/api/stats/affiliations", get(handlers::affiliation_charts))
        .route("/api/stats/dashboard", get(handlers::dashboard))
        .route("/api/views/:screen", get(handlers::current_view))
        .route("/api/views/:screen/events", post(handlers::view_event))
        .with_state(state)
        .layer(axum::middleware::from_fn(log_request))
        .layer(CorsLayer::permissive())
}

async fn log_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        %method,
        %uri,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request served"
    );
    response
}
