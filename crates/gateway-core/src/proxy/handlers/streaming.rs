//! Rendering of dispatch results, including the SSE wire format.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::convert::Infallible;

use super::errors::sse_error_frame;
use crate::proxy::dispatcher::{DispatchOutput, InboundFormat};

const DONE_FRAME: &str = "data: [DONE]\n\n";

pub fn render_output(output: DispatchOutput) -> Response {
    match output {
        DispatchOutput::Completion(completion) => Json(completion).into_response(),
        DispatchOutput::Native(body) => Json(body).into_response(),
        DispatchOutput::CompletionStream(chunks) => {
            let frames = chunks
                .map(|item| match item {
                    Ok(chunk) => match serde_json::to_string(&chunk) {
                        Ok(json) => Bytes::from(format!("data: {}\n\n", json)),
                        Err(e) => {
                            tracing::error!("Chunk serialization failed: {}", e);
                            Bytes::new()
                        },
                    },
                    Err(err) => sse_error_frame(InboundFormat::OpenAI, &err),
                })
                .chain(futures::stream::once(async { Bytes::from_static(DONE_FRAME.as_bytes()) }));
            sse_response(frames)
        },
        DispatchOutput::NativeStream(chunks) => {
            let frames = chunks.map(|item| match item {
                Ok(chunk) => Bytes::from(format!("data: {}\n\n", chunk)),
                Err(err) => sse_error_frame(InboundFormat::Native, &err),
            });
            sse_response(frames)
        },
    }
}

/// Dropping the body (client disconnect) drops the whole upstream chain.
fn sse_response(frames: impl Stream<Item = Bytes> + Send + 'static) -> Response {
    let body = Body::from_stream(frames.map(Ok::<_, Infallible>));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response()
}
