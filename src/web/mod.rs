pub mod forms;
pub mod gate;
mod reply;
mod routes;

use axum::Router;
use log::info;
use std::sync::Arc;

use crate::upstream::{AdminApi, SessionManager};
pub use gate::RequestGate;

// ── Shared State ──

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn AdminApi>,
    pub sessions: Arc<dyn SessionManager>,
    pub gate: RequestGate,
}

// ── Server ──

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::gateway_routes())
        .fallback(reply::handle_not_found)
        .with_state(state)
}

pub async fn start_server(state: AppState, port: u16) {
    info!("[web] initializing gateway on port {}", port);
    let app = router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind address {}: {}", addr, e));
    info!("[web] gateway listening on {}", addr);
    axum::serve(listener, app).await.expect("Server error");
}
