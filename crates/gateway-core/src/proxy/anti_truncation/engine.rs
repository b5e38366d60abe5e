use gateway_types::ProxyError;
use serde_json::Value;

use super::continuation::{add_usage, build_continuation_request, replace_candidate_text};
use super::detection::{needs_continuation, TurnSummary};
use super::done_marker::strip_done_marker;
use super::splice::trim_overlap;
use super::{AntiTruncationEngine, UpstreamCaller};
use crate::proxy::mappers::accumulator::StreamChunkAccumulator;

impl AntiTruncationEngine {
    /// Non-streaming call with continuation.
    ///
    /// A failed continuation ends the loop; what was gathered so far is
    /// returned with the original finish reason.
    pub async fn generate(
        &self,
        caller: &dyn UpstreamCaller,
        model: &str,
        request: &Value,
        done_mode: bool,
    ) -> Result<Value, ProxyError> {
        let mut response = caller.generate(model, request).await?;
        if !self.is_active(done_mode) {
            return Ok(response);
        }

        let mut accumulator = StreamChunkAccumulator::new();
        let first = accumulator.ingest(&response);
        let original_finish = first.finish_reason.clone();
        let (mut text, mut found_marker) = if done_mode {
            strip_done_marker(&first.text)
        } else {
            (first.text.clone(), false)
        };
        let mut finish = first.finish_reason.clone();
        let mut last_calls: Option<Vec<Value>> = None;
        let mut attempts = 0;

        loop {
            let turn = TurnSummary {
                finish_reason: finish.as_deref(),
                has_tool_calls: accumulator.has_tool_calls(),
                text: &text,
                done_mode,
                found_done_marker: found_marker,
            };
            if !needs_continuation(&turn) {
                break;
            }
            if attempts >= self.config.max_attempts {
                tracing::warn!("⚠️ Continuation bound reached for {} after {} attempts", model, attempts);
                finish = original_finish.clone();
                break;
            }
            attempts += 1;
            tracing::info!(
                "🔁 Answer for {} looks truncated ({}), continuation {}/{}",
                model,
                finish.as_deref().unwrap_or("no finish reason"),
                attempts,
                self.config.max_attempts
            );

            let follow_up = build_continuation_request(request, &text, done_mode);
            let next = match caller.generate(model, &follow_up).await {
                Ok(next) => next,
                Err(err) => {
                    tracing::warn!("⚠️ Continuation {} failed for {}: {}", attempts, model, err);
                    finish = original_finish.clone();
                    break;
                },
            };

            let delta = accumulator.ingest(&next);
            let (piece, marker) =
                if done_mode { strip_done_marker(&delta.text) } else { (delta.text.clone(), false) };
            found_marker = marker;
            let trimmed = trim_overlap(
                &text,
                &piece,
                self.config.min_overlap_chars,
                self.config.max_overlap_chars,
            );
            text.push_str(trimmed);
            finish = delta.finish_reason.clone();
            if !delta.tool_calls.is_empty() {
                last_calls = next
                    .get("candidates")
                    .and_then(|c| c.get(0))
                    .and_then(|c| c.get("content"))
                    .and_then(|c| c.get("parts"))
                    .and_then(|p| p.as_array())
                    .map(|parts| parts.iter().filter(|p| p.get("functionCall").is_some()).cloned().collect());
            }
            add_usage(&mut response, &next);
        }

        if attempts == 0 && !done_mode {
            return Ok(response);
        }

        replace_candidate_text(&mut response, &text);
        if let Some(calls) = last_calls {
            if let Some(parts) = response
                .get_mut("candidates")
                .and_then(|c| c.get_mut(0))
                .and_then(|c| c.get_mut("content"))
                .and_then(|c| c.get_mut("parts"))
                .and_then(|p| p.as_array_mut())
            {
                parts.extend(calls);
            }
        }
        if let Some(reason) = finish {
            super::continuation::set_finish_reason(&mut response, &reason);
        }
        if attempts > 0 {
            tracing::info!("✅ Spliced {} continuation(s) for {}", attempts, model);
        }
        Ok(response)
    }
}
