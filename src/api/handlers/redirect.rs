//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::error;

use crate::application::services::Resolution;
use crate::state::AppState;

/// Redirects an external id to its destination URL.
///
/// # Endpoint
///
/// `GET /{id}`
///
/// # Request Flow
///
/// 1. In strict mode, reject requests whose `Host` header differs from the
///    configured base URL host
/// 2. Resolve via cache → shard router → backend
/// 3. `Found` → 302 with `Location`; `NotFound` → 404; storage failure → 500
///
/// The 404 body is identical for malformed ids, unknown shards, and absent or
/// expired entries.
pub async fn redirect_handler(
    Path(external_id): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    if let Some(expected) = &state.strict_host {
        let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
        if host != Some(expected.as_str()) {
            return not_found();
        }
    }

    let now = Utc::now().timestamp();
    match state.resolver.resolve(&external_id, now).await {
        Ok(Resolution::Found(url)) => {
            (StatusCode::FOUND, [(header::LOCATION, url)]).into_response()
        }
        Ok(Resolution::NotFound) => not_found(),
        Err(err) => {
            error!("failed resolving {external_id}: {err}");
            err.into_response()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}
