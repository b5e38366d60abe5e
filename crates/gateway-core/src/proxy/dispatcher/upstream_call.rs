//! One logical upstream call: acquire, wrap, send, retry on 429, report.

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use gateway_types::ProxyError;
use reqwest::header::RETRY_AFTER;
use serde_json::Value;
use std::time::Duration;

use super::guard::OutcomeGuard;
use super::RequestDispatcher;
use crate::proxy::anti_truncation::{GeminiEventStream, UpstreamCaller};
use crate::proxy::common::{
    parse_retry_after_header, parse_retry_time_from_body, sanitize_upstream_error, SseDataBuffer,
};
use crate::proxy::credential_pool::{CallOutcome, CredentialLease};
use crate::proxy::mappers::gemini::{unwrap_response, wrap_request};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallKind {
    Generate,
    Stream,
}

impl CallKind {
    fn method(self) -> &'static str {
        match self {
            CallKind::Generate => "generateContent",
            CallKind::Stream => "streamGenerateContent",
        }
    }

    fn query(self) -> Option<&'static str> {
        match self {
            CallKind::Generate => None,
            CallKind::Stream => Some("alt=sse"),
        }
    }
}

fn transport_error() -> ProxyError {
    ProxyError::Upstream { status: 502, message: "Upstream unreachable".to_string() }
}

fn hint_secs(hint: Option<Duration>) -> Option<u64> {
    hint.map(|d| (d.as_millis() as u64).div_ceil(1000))
}

impl RequestDispatcher {
    /// Send `request` for `model` until a non-429 answer or the retry bound.
    ///
    /// Every attempt acquires a fresh lease; a 429 is reported against the
    /// lease that saw it before the next attempt. On a 2xx the lease is
    /// handed back unreported, together with the open response.
    pub(crate) async fn send_with_retry(
        &self,
        model: &str,
        request: &Value,
        kind: CallKind,
    ) -> Result<(CredentialLease, reqwest::Response), ProxyError> {
        let attempts = self.retry.total_attempts();
        let mut last_rate_limit: Option<ProxyError> = None;
        let mut rate_limited_lease: Option<CredentialLease> = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.retry.interval_ms.saturating_mul(u64::from(attempt));
                tracing::debug!("Retrying {} in {}ms (attempt {}/{})", model, delay, attempt + 1, attempts);
                if delay > 0 {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
            }

            // Once a 429 was seen, an empty pool means everything is cooling down.
            // The retry then goes back to the credential that was just limited.
            let lease = match self.pool.acquire(model) {
                Ok(lease) => lease,
                Err(err) => match rate_limited_lease.as_ref().and_then(|l| self.pool.renew(l)) {
                    Some(lease) => {
                        tracing::debug!("Nothing else usable, retrying {} on {}", model, lease.credential_id);
                        lease
                    },
                    None => return Err(last_rate_limit.unwrap_or(err)),
                },
            };
            let project_id = self.project_for(&lease).await?;
            let wrapped = wrap_request(request, model, &project_id, self.upstream.user_agent());

            let response = match self
                .upstream
                .call_v1_internal(kind.method(), &lease.access_token, &wrapped, kind.query())
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!("⚠️ Upstream unreachable via {}: {}", lease.credential_id, e);
                    self.pool.report(&lease, CallOutcome::ServerError(502));
                    return Err(transport_error());
                },
            };

            let status = response.status().as_u16();
            if response.status().is_success() {
                return Ok((lease, response));
            }

            let header_hint = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after_header);
            let body = response.text().await.unwrap_or_default();

            if status == 429 {
                let retry_after = parse_retry_time_from_body(&body).or(header_hint);
                tracing::warn!(
                    "⏳ 429 for {} via {} (attempt {}/{})",
                    model,
                    lease.credential_id,
                    attempt + 1,
                    attempts
                );
                self.pool.report(&lease, CallOutcome::RateLimited { retry_after });
                last_rate_limit = Some(ProxyError::RateLimited {
                    retry_after_secs: hint_secs(retry_after),
                    message: sanitize_upstream_error(status, &body),
                });
                rate_limited_lease = Some(lease);
                continue;
            }

            tracing::warn!("❌ Upstream {} for {} via {}", status, model, lease.credential_id);
            tracing::debug!("Upstream error body: {}", body);
            self.pool.report(&lease, CallOutcome::from_status(status, None));
            return Err(ProxyError::Upstream { status, message: sanitize_upstream_error(status, &body) });
        }

        Err(last_rate_limit.unwrap_or_else(|| ProxyError::Internal {
            message: "retry loop ended without an attempt".to_string(),
        }))
    }

    /// Project bound to the lease, resolved on first use.
    async fn project_for(&self, lease: &CredentialLease) -> Result<String, ProxyError> {
        if let Some(project_id) = &lease.project_id {
            return Ok(project_id.clone());
        }
        tracing::info!("🔗 Resolving project for credential {}", lease.credential_id);
        self.pool.verify_project_association(&lease.credential_id, self.upstream.as_ref()).await
    }
}

#[async_trait]
impl UpstreamCaller for RequestDispatcher {
    async fn generate(&self, model: &str, request: &Value) -> Result<Value, ProxyError> {
        let (lease, response) = self.send_with_retry(model, request, CallKind::Generate).await?;
        match response.json::<Value>().await {
            Ok(body) => {
                self.pool.report(&lease, CallOutcome::Success);
                Ok(unwrap_response(body))
            },
            Err(e) => {
                tracing::warn!("⚠️ Unreadable upstream response via {}: {}", lease.credential_id, e);
                self.pool.report(&lease, CallOutcome::ServerError(502));
                Err(ProxyError::Upstream {
                    status: 502,
                    message: "Upstream returned an unreadable response".to_string(),
                })
            },
        }
    }

    async fn stream_generate(&self, model: &str, request: &Value) -> Result<GeminiEventStream, ProxyError> {
        let (lease, response) = self.send_with_retry(model, request, CallKind::Stream).await?;
        let credential_id = lease.credential_id.clone();
        let mut guard = OutcomeGuard::new(self.pool.clone(), lease);
        let mut bytes = Box::pin(response.bytes_stream());

        Ok(Box::pin(stream! {
            let mut buffer = SseDataBuffer::new();
            while let Some(item) = bytes.next().await {
                let chunk = match item {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        tracing::warn!("⚠️ Upstream stream via {} broke: {}", credential_id, e);
                        guard.fail(CallOutcome::ServerError(502));
                        yield Err(ProxyError::Upstream {
                            status: 502,
                            message: "Upstream stream interrupted".to_string(),
                        });
                        return;
                    },
                };
                for payload in buffer.push(&chunk) {
                    match serde_json::from_str::<Value>(&payload) {
                        Ok(value) => {
                            guard.mark_data();
                            yield Ok(unwrap_response(value));
                        },
                        Err(e) => tracing::warn!("Skipping malformed stream payload: {}", e),
                    }
                }
            }
            if let Some(payload) = buffer.finish() {
                if let Ok(value) = serde_json::from_str::<Value>(&payload) {
                    guard.mark_data();
                    yield Ok(unwrap_response(value));
                }
            }

            let empty = !guard.received_data();
            guard.complete();
            if empty {
                tracing::warn!("⚠️ Upstream stream via {} ended without data", credential_id);
                yield Err(ProxyError::Upstream {
                    status: 502,
                    message: "Upstream returned an empty stream".to_string(),
                });
            }
        }))
    }
}
