// Native GenerateContent endpoints
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use gateway_types::ProxyError;
use serde_json::{json, Value};

use super::errors::error_response;
use super::streaming::render_output;
use crate::proxy::dispatcher::InboundFormat;
use crate::proxy::mappers::model_features::list_model_variants;
use crate::proxy::server::AppState;

const GENERATE: &str = "generateContent";
const STREAM_GENERATE: &str = "streamGenerateContent";

/// Split `{model}:{action}`. The model part may itself contain `/` (the
/// anti-truncation prefix), so the split is on the last colon.
pub fn split_model_action(model_action: &str) -> Option<(&str, &str)> {
    let (model, action) = model_action.trim_start_matches('/').rsplit_once(':')?;
    if model.is_empty() {
        return None;
    }
    Some((model, action))
}

/// `POST /v1/models/{model}:{action}` and its `/v1beta` twin.
pub async fn handle_model_action(
    State(state): State<AppState>,
    Path(model_action): Path<String>,
    body: Bytes,
) -> Response {
    let Some((model, action)) = split_model_action(&model_action) else {
        return not_found(&model_action);
    };
    let stream = match action {
        GENERATE => false,
        STREAM_GENERATE => true,
        _ => return not_found(&model_action),
    };

    let body: Value = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => {
            let err = ProxyError::InvalidRequest { message: format!("body is not valid JSON: {}", e) };
            return error_response(InboundFormat::Native, &err);
        },
    };

    match state.dispatcher.dispatch_native(model, body, stream).await {
        Ok(output) => render_output(output),
        Err(err) => error_response(InboundFormat::Native, &err),
    }
}

/// `GET /v1beta/models`
pub async fn handle_list_models(State(state): State<AppState>) -> impl IntoResponse {
    let models: Vec<Value> = list_model_variants(&state.models).iter().map(|id| model_entry(id)).collect();
    Json(json!({ "models": models }))
}

/// `GET /v1beta/models/{model}`
pub async fn handle_get_model(State(state): State<AppState>, Path(model): Path<String>) -> Response {
    let id = model.trim_start_matches('/').trim_start_matches("models/");
    if list_model_variants(&state.models).iter().any(|m| m == id) {
        Json(model_entry(id)).into_response()
    } else {
        not_found(id)
    }
}

fn model_entry(id: &str) -> Value {
    json!({
        "name": format!("models/{}", id),
        "displayName": id,
        "supportedGenerationMethods": [GENERATE, STREAM_GENERATE]
    })
}

fn not_found(what: &str) -> Response {
    error_response(
        InboundFormat::Native,
        &ProxyError::Upstream { status: 404, message: format!("{} is not found", what) },
    )
}
