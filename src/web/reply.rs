use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{info, warn};

use crate::outcome::Outcome;

/// Serializes an operation outcome. Both envelope shapes go out as 200.
pub fn outcome_response(operation: &str, outcome: Outcome) -> Response {
    match outcome.error_code() {
        Some(code) => info!("[web] {} finished with error {}", operation, code),
        None => info!("[web] {} succeeded", operation),
    }
    (StatusCode::OK, Json(outcome)).into_response()
}

pub fn missing_data(operation: &str) -> Response {
    warn!("[web] {} rejected: required field missing", operation);
    (StatusCode::OK, Json(Outcome::missing_data())).into_response()
}

pub async fn handle_not_found(uri: Uri) -> Response {
    warn!("[web] no endpoint at {}", uri.path());
    let outcome = Outcome::error("NOT_FOUND", format!("No endpoint exists at {}", uri.path()));
    (StatusCode::NOT_FOUND, Json(outcome)).into_response()
}
