// OpenAI-compatible endpoints
use axum::{extract::State, response::IntoResponse, response::Response, Json};
use bytes::Bytes;
use gateway_types::ProxyError;
use serde_json::{json, Value};

use super::errors::error_response;
use super::streaming::render_output;
use crate::proxy::dispatcher::InboundFormat;
use crate::proxy::mappers::model_features::list_model_variants;
use crate::proxy::server::AppState;

/// `POST /v1/chat/completions`. Native bodies are accepted here too and
/// answered in the native format.
pub async fn handle_chat_completions(State(state): State<AppState>, body: Bytes) -> Response {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => {
            let err = ProxyError::InvalidRequest { message: format!("body is not valid JSON: {}", e) };
            return error_response(InboundFormat::OpenAI, &err);
        },
    };

    let (format, result) = state.dispatcher.dispatch(body).await;
    match result {
        Ok(output) => render_output(output),
        Err(err) => error_response(format, &err),
    }
}

/// `GET /v1/models`
pub async fn handle_list_models(State(state): State<AppState>) -> impl IntoResponse {
    let data: Vec<Value> = list_model_variants(&state.models)
        .into_iter()
        .map(|id| {
            json!({
                "id": id,
                "object": "model",
                "created": 1_706_745_600,
                "owned_by": "google"
            })
        })
        .collect();

    Json(json!({
        "object": "list",
        "data": data
    }))
}
