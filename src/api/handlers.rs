use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{CreateLinkRequest, Link, LinkPatch, NewLink, UpdateLinkRequest};
use crate::storage::Storage;
use crate::tracking::{extract_client_ip, Tracker, VisitContext, VisitOutcome};

use super::response::{ApiError, ApiResponse};

pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub tracker: Arc<Tracker>,
}

const GENERATED_CODE_LEN: usize = 8;
const CUSTOM_CODE_MIN: usize = 3;
const CUSTOM_CODE_MAX: usize = 32;
const MAX_GENERATION_ATTEMPTS: usize = 10;

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Generate a random 8-character alphanumeric short code
fn generate_short_code() -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;
    rand::thread_rng()
        .sample_iter(Alphanumeric)
        .take(GENERATED_CODE_LEN)
        .map(char::from)
        .collect()
}

fn validate_destination(raw: &str) -> Result<String, ApiError> {
    let parsed = url::Url::parse(raw)
        .map_err(|_| ApiError::InvalidInput("Destination must be a valid URL".to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::InvalidInput(
            "Destination URL must use http or https".to_string(),
        ));
    }
    Ok(parsed.to_string())
}

fn validate_custom_code(code: &str) -> Result<(), ApiError> {
    if code.len() < CUSTOM_CODE_MIN || code.len() > CUSTOM_CODE_MAX {
        return Err(ApiError::InvalidInput(format!(
            "Custom code must be {CUSTOM_CODE_MIN}-{CUSTOM_CODE_MAX} characters"
        )));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::InvalidInput(
            "Custom code may only contain letters, digits, '-' and '_'".to_string(),
        ));
    }
    Ok(())
}

/// Create a new short link
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Link>>), ApiError> {
    let destination_url = validate_destination(&payload.url)?;

    let short_code = match payload.custom_code {
        Some(custom) => {
            validate_custom_code(&custom)?;
            custom
        }
        None => {
            // Codes are never recycled, so collisions stay unlikely; retry a
            // bounded number of times anyway
            let mut code = generate_short_code();
            let mut attempts = 0;
            while state.storage.code_exists(&code).await? && attempts < MAX_GENERATION_ATTEMPTS {
                code = generate_short_code();
                attempts += 1;
            }
            if attempts >= MAX_GENERATION_ATTEMPTS {
                return Err(ApiError::Internal(anyhow::anyhow!(
                    "failed to generate a unique short code"
                )));
            }
            code
        }
    };

    let link = state
        .storage
        .create_link(&NewLink {
            short_code,
            destination_url,
            title: payload.title,
            description: payload.description,
        })
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::ok(link)))
}

/// Get a link by id
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Link>>, ApiError> {
    match state.storage.get_link(id).await? {
        Some(link) => Ok(ApiResponse::ok(link)),
        None => Err(ApiError::NotFound("Link")),
    }
}

/// List links, newest first
pub async fn list_links(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Link>>>, ApiError> {
    let limit = query.limit.clamp(1, 500);
    let offset = query.offset.max(0);
    let links = state.storage.list_links(limit, offset).await?;
    Ok(ApiResponse::ok(links))
}

/// Partial update; never touches the short code or the click counter
pub async fn update_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<ApiResponse<Link>>, ApiError> {
    let destination_url = match payload.url {
        Some(raw) => Some(validate_destination(&raw)?),
        None => None,
    };

    let patch = LinkPatch {
        destination_url,
        title: payload.title,
        description: payload.description,
        is_active: payload.is_active,
    };

    match state.storage.update_link(id, &patch).await? {
        Some(link) => Ok(ApiResponse::ok(link)),
        None => Err(ApiError::NotFound("Link")),
    }
}

/// Delete a link and its click history
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if state.storage.delete_link(id).await? {
        Ok(ApiResponse::message("Link deleted"))
    } else {
        Err(ApiError::NotFound("Link"))
    }
}

#[derive(Serialize)]
pub struct TrackResult {
    pub destination_url: String,
}

/// API-invoked tracked visit: the click is recorded before this responds.
pub async fn track_visit(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<TrackResult>>, ApiError> {
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

    match state.tracker.track_visit(&code, ctx).await? {
        VisitOutcome::Redirect(destination_url) => {
            Ok(ApiResponse::ok(TrackResult { destination_url }))
        }
        VisitOutcome::NotFound => Err(ApiError::NotFound("Link")),
        VisitOutcome::Gone => Err(ApiError::Gone),
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<ApiResponse<()>> {
    ApiResponse::message("OK")
}
