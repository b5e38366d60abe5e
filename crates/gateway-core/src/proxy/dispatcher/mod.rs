//! Request orchestration.
//!
//! One logical request flows strictly in order: detect the inbound format,
//! translate it to a native body, call upstream through the anti-truncation
//! engine (which calls back into [`RequestDispatcher`] for every upstream
//! call), translate the answer back. Credential acquisition and outcome
//! reporting happen per upstream call in `upstream_call`.

mod format;
mod guard;
mod upstream_call;

#[cfg(test)]
mod tests;

pub use format::{detect_format, InboundFormat};
pub use guard::OutcomeGuard;

use async_stream::stream;
use futures::{Stream, StreamExt};
use gateway_types::models::{GatewayConfig, RetryConfig};
use gateway_types::ProxyError;
use serde_json::Value;
use std::pin::Pin;
use std::sync::Arc;

use crate::proxy::anti_truncation::{AntiTruncationEngine, GeminiEventStream};
use crate::proxy::credential_pool::CredentialPool;
use crate::proxy::mappers::fake_stream::split_response;
use crate::proxy::mappers::gemini::prepare_native_request;
use crate::proxy::mappers::openai::{
    build_chat_completion, build_gemini_request, ChatCompletion, ChatCompletionChunk,
    OpenAIRequest, StreamTranslator,
};
use crate::proxy::mappers::ModelFeatures;
use crate::proxy::upstream::UpstreamClient;

/// OpenAI chunk frames of one outward stream.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk, ProxyError>> + Send>>;

/// What a handler renders.
pub enum DispatchOutput {
    Completion(ChatCompletion),
    CompletionStream(ChunkStream),
    Native(Value),
    NativeStream(GeminiEventStream),
}

impl std::fmt::Debug for DispatchOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completion(c) => f.debug_tuple("Completion").field(&c.id).finish(),
            Self::CompletionStream(_) => f.write_str("CompletionStream"),
            Self::Native(_) => f.write_str("Native"),
            Self::NativeStream(_) => f.write_str("NativeStream"),
        }
    }
}

/// Cheap to clone: every field is shared or small.
#[derive(Clone)]
pub struct RequestDispatcher {
    pool: Arc<CredentialPool>,
    upstream: Arc<UpstreamClient>,
    retry: RetryConfig,
    anti_truncation: AntiTruncationEngine,
}

impl RequestDispatcher {
    pub fn new(
        pool: Arc<CredentialPool>,
        upstream: Arc<UpstreamClient>,
        retry: RetryConfig,
        anti_truncation: AntiTruncationEngine,
    ) -> Self {
        Self { pool, upstream, retry, anti_truncation }
    }

    pub fn from_config(
        config: &GatewayConfig,
        pool: Arc<CredentialPool>,
        upstream: Arc<UpstreamClient>,
    ) -> Self {
        Self::new(
            pool,
            upstream,
            config.retry.clone(),
            AntiTruncationEngine::new(config.anti_truncation.clone()),
        )
    }

    pub fn pool(&self) -> &Arc<CredentialPool> {
        &self.pool
    }

    pub fn upstream(&self) -> &Arc<UpstreamClient> {
        &self.upstream
    }

    /// Entry point of the chat route: either format may arrive there.
    ///
    /// The detected format is returned alongside the result so errors can be
    /// rendered in the caller's own envelope.
    pub async fn dispatch(&self, body: Value) -> (InboundFormat, Result<DispatchOutput, ProxyError>) {
        let format = match detect_format(&body) {
            Ok(format) => format,
            Err(err) => return (InboundFormat::OpenAI, Err(err)),
        };
        let result = match format {
            InboundFormat::OpenAI => self.dispatch_openai(body).await,
            InboundFormat::Native => {
                let model = body.get("model").and_then(Value::as_str).map(str::to_string);
                let stream = body.get("stream").and_then(Value::as_bool).unwrap_or(false);
                match model {
                    Some(model) => self.dispatch_native(&model, body, stream).await,
                    None => Err(ProxyError::InvalidRequest {
                        message: "native body on the chat route needs a model field".to_string(),
                    }),
                }
            },
        };
        (format, result)
    }

    /// OpenAI ChatCompletions request, answered in the same format.
    pub async fn dispatch_openai(&self, body: Value) -> Result<DispatchOutput, ProxyError> {
        let request: OpenAIRequest = serde_json::from_value(body).map_err(|e| {
            ProxyError::InvalidRequest { message: format!("malformed chat completion request: {}", e) }
        })?;
        let features = ModelFeatures::parse(&request.model);
        // Tool problems surface here, before any credential is touched.
        let mut native = build_gemini_request(&request, &features)?;
        self.anti_truncation.prepare_request(&mut native, features.anti_truncation);

        tracing::info!(
            "📨 chat.completions {} → {} (stream: {})",
            request.model,
            features.base_model,
            request.stream
        );

        if request.stream {
            let upstream = self.native_stream(&features, native).await?;
            return Ok(DispatchOutput::CompletionStream(translate_stream(upstream, request.model)));
        }

        let response = self
            .anti_truncation
            .generate(self, &features.base_model, &native, features.anti_truncation)
            .await?;
        Ok(DispatchOutput::Completion(build_chat_completion(&response, &request.model)))
    }

    /// Native GenerateContent request, passed through after feature handling.
    pub async fn dispatch_native(
        &self,
        model: &str,
        body: Value,
        stream: bool,
    ) -> Result<DispatchOutput, ProxyError> {
        if detect_format(&body)? != InboundFormat::Native {
            return Err(ProxyError::InvalidRequest {
                message: "expected a GenerateContent body with contents[]".to_string(),
            });
        }
        let features = ModelFeatures::parse(model);
        let mut native = prepare_native_request(&body, &features)?;
        self.anti_truncation.prepare_request(&mut native, features.anti_truncation);

        tracing::info!("📨 generateContent {} → {} (stream: {})", model, features.base_model, stream);

        if stream {
            let upstream = self.native_stream(&features, native).await?;
            return Ok(DispatchOutput::NativeStream(upstream));
        }

        let response = self
            .anti_truncation
            .generate(self, &features.base_model, &native, features.anti_truncation)
            .await?;
        Ok(DispatchOutput::Native(response))
    }

    /// Open the engine stream and wait for its first item, so failures that
    /// happen before any output become a plain error response.
    ///
    /// Fake-stream models make one non-streaming call and replay its answer.
    async fn native_stream(
        &self,
        features: &ModelFeatures,
        native: Value,
    ) -> Result<GeminiEventStream, ProxyError> {
        if features.fake_stream {
            let response = self
                .anti_truncation
                .generate(self, &features.base_model, &native, features.anti_truncation)
                .await?;
            let chunks = split_response(&response);
            tracing::debug!("Replaying {} response as {} chunks", features.base_model, chunks.len());
            return Ok(Box::pin(futures::stream::iter(chunks.into_iter().map(Ok))));
        }

        let caller = Arc::new(self.clone());
        let upstream = self.anti_truncation.stream(
            caller,
            features.base_model.clone(),
            native,
            features.anti_truncation,
        );
        peek_first(upstream).await
    }
}

async fn peek_first(mut upstream: GeminiEventStream) -> Result<GeminiEventStream, ProxyError> {
    match upstream.next().await {
        Some(Ok(first)) => Ok(Box::pin(futures::stream::once(async move { Ok(first) }).chain(upstream))),
        Some(Err(err)) => Err(err),
        None => Err(ProxyError::Upstream {
            status: 502,
            message: "Upstream returned an empty stream".to_string(),
        }),
    }
}

/// Native chunks → OpenAI frames under one completion id.
pub fn translate_stream(mut upstream: GeminiEventStream, model: String) -> ChunkStream {
    Box::pin(stream! {
        let mut translator = StreamTranslator::new(model);
        while let Some(item) = upstream.next().await {
            match item {
                Ok(chunk) => {
                    if let Some(frame) = translator.translate(&chunk) {
                        yield Ok(frame);
                    }
                },
                Err(err) => {
                    tracing::warn!("⚠️ Stream {} ended with error: {}", translator.id(), err);
                    yield Err(err);
                    return;
                },
            }
        }
        if let Some(frame) = translator.finish() {
            yield Ok(frame);
        }
    })
}
