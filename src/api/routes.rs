use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::storage::Storage;
use crate::tracking::Tracker;

use super::analytics::get_link_analytics;
use super::handlers::{
    create_link, delete_link, get_link, health_check, list_links, track_visit, update_link,
    AppState,
};

pub fn create_api_router(storage: Arc<dyn Storage>, tracker: Arc<Tracker>) -> Router {
    let state = Arc::new(AppState { storage, tracker });

    let api_routes = Router::new()
        .route("/links", post(create_link))
        .route("/links", get(list_links))
        .route("/links/{id}", get(get_link))
        .route("/links/{id}", put(update_link))
        .route("/links/{id}", delete(delete_link))
        .route("/links/{id}/analytics", get(get_link_analytics))
        .route("/track/{code}", post(track_visit))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
