//! Operator API under `/admin`: credential management and on-demand flushes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gateway_types::models::CredentialRecord;
use gateway_types::ProxyError;
use serde::Deserialize;
use serde_json::{json, Value};

use super::errors::error_response;
use crate::proxy::dispatcher::InboundFormat;
use crate::proxy::server::AppState;

#[derive(Debug, Deserialize)]
pub struct UpsertCredentialRequest {
    /// Generated when absent
    #[serde(default)]
    pub id: Option<String>,
    pub credential: Value,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl UpsertCredentialRequest {
    pub fn into_record(self) -> CredentialRecord {
        let id = self.id.filter(|s| !s.is_empty()).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut record = CredentialRecord::new(id, self.credential);
        if self.user_email.is_some() {
            record.user_email = self.user_email;
        }
        record.project_id = self.project_id;
        record
    }
}

fn failure(err: &ProxyError) -> Response {
    error_response(InboundFormat::OpenAI, err)
}

pub async fn handle_list_credentials(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "credentials": state.pool.list(),
        "stats": state.pool.stats()
    }))
}

pub async fn handle_upsert_credential(
    State(state): State<AppState>,
    Json(request): Json<UpsertCredentialRequest>,
) -> Response {
    let record = request.into_record();
    if record.access_token().is_none() {
        return failure(&ProxyError::InvalidRequest {
            message: "credential payload has no access_token".to_string(),
        });
    }
    let id = record.id.clone();
    let replaced = state.pool.upsert(record);
    state.pool.request_flush();
    let status = if replaced.is_some() { StatusCode::OK } else { StatusCode::CREATED };
    (status, Json(json!({ "id": id, "replaced": replaced }))).into_response()
}

pub async fn handle_disable_credential(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    set_disabled(&state, &id, true)
}

pub async fn handle_enable_credential(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    set_disabled(&state, &id, false)
}

fn set_disabled(state: &AppState, id: &str, disabled: bool) -> Response {
    match state.pool.set_disabled(id, disabled) {
        Ok(()) => {
            state.pool.request_flush();
            Json(json!({ "id": id, "disabled": disabled })).into_response()
        },
        Err(err) => failure(&err),
    }
}

pub async fn handle_delete_credential(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.pool.delete(&id) {
        Ok(removed) => {
            state.pool.request_flush();
            Json(json!({ "id": removed.id, "deleted": true })).into_response()
        },
        Err(err) => failure(&err),
    }
}

pub async fn handle_verify_credential(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let resolver = state.dispatcher.upstream().clone();
    match state.pool.verify_project_association(&id, resolver.as_ref()).await {
        Ok(project_id) => {
            state.pool.request_flush();
            Json(json!({ "id": id, "project_id": project_id })).into_response()
        },
        Err(err) => failure(&err),
    }
}

pub async fn handle_flush(State(state): State<AppState>) -> Response {
    let Some(worker) = state.persistence.as_ref() else {
        return failure(&ProxyError::Internal { message: "persistence is not running".to_string() });
    };
    match worker.flush_once().await {
        Ok(flushed) => Json(json!({ "flushed": flushed })).into_response(),
        Err(e) => {
            tracing::warn!("⚠️ Manual flush failed: {}", e);
            failure(&ProxyError::Internal { message: "flush failed".to_string() })
        },
    }
}
