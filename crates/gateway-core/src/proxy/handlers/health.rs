use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::proxy::server::AppState;

/// `GET /healthz`; no auth, no upstream traffic.
pub async fn handle_healthz(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.pool.stats();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "credentials": {
            "total": stats.total,
            "enabled": stats.enabled
        }
    }))
}
