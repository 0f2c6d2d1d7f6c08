use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::tracking::Tracker;

use super::handlers::{health_check, redirect_visit, RedirectState};

pub fn create_redirect_router(tracker: Arc<Tracker>) -> Router {
    let state = Arc::new(RedirectState { tracker });

    Router::new()
        .route("/", get(health_check))
        .route("/{code}", get(redirect_visit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
