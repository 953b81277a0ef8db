use axum::{extract::State, response::Response};
use log::debug;
use serde_json::json;

use crate::outcome::Outcome;
use crate::web::reply::outcome_response;
use crate::web::AppState;

/// Unsigned liveness probe. Reports when the last upstream session was
/// acquired, without touching the upstream.
pub async fn check(State(state): State<AppState>) -> Response {
    debug!("[web] GET /health");
    let session = state.sessions.credentials().await;
    let payload = json!({
        "status": "ok",
        "sessionAcquiredAt": session.map(|c| c.acquired_at.to_rfc3339()),
    });
    outcome_response("health", Outcome::from(payload))
}
