use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::tracking::{extract_client_ip, Tracker, VisitContext, VisitOutcome};

pub struct RedirectState {
    pub tracker: Arc<Tracker>,
}

/// Tracked redirect endpoint.
///
/// Responds with a 302 as soon as the link is resolved; the visit record
/// (geolocation, click append, counter increment) runs detached and can
/// never delay or fail the redirect.
pub async fn redirect_visit(
    State(state): State<Arc<RedirectState>>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let ctx = VisitContext {
        ip_address: extract_client_ip(&headers),
        user_agent: headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        referer: headers
            .get("referer")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    match state.tracker.handle_visit(&code, ctx).await {
        // 302 Found, not axum's Redirect helpers (303/307/308)
        Ok(VisitOutcome::Redirect(destination)) => {
            (StatusCode::FOUND, [(header::LOCATION, destination)]).into_response()
        }
        Ok(VisitOutcome::NotFound) => (StatusCode::NOT_FOUND, "Link not found").into_response(),
        Ok(VisitOutcome::Gone) => {
            (StatusCode::GONE, "This link has been deactivated").into_response()
        }
        Err(err) => {
            tracing::error!(short_code = %code, error = %err, "redirect lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
    }

    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
