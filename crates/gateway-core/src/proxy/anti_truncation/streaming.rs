use async_stream::stream;
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;

use super::continuation::{
    build_continuation_request, finish_chunk, has_parts, replace_candidate_text, set_finish_reason,
    strip_terminal, text_chunk,
};
use super::detection::{needs_continuation, TurnSummary};
use super::done_marker::DoneMarkerFilter;
use super::splice::HeadSplicer;
use super::{AntiTruncationEngine, GeminiEventStream, UpstreamCaller};
use crate::proxy::mappers::accumulator::StreamChunkAccumulator;

impl AntiTruncationEngine {
    /// Streaming call with continuation.
    ///
    /// Chunks pass through as they arrive. The terminal chunk of each
    /// upstream stream is held until the engine has decided; when it
    /// continues, the held chunk is sent without its finish reason and the
    /// next upstream stream is spliced onto the same output.
    pub fn stream(
        &self,
        caller: Arc<dyn UpstreamCaller>,
        model: String,
        request: Value,
        done_mode: bool,
    ) -> GeminiEventStream {
        let active = self.is_active(done_mode);
        let config = self.config.clone();

        Box::pin(stream! {
            let mut upstream = match caller.stream_generate(&model, &request).await {
                Ok(s) => s,
                Err(err) => {
                    yield Err(err);
                    return;
                },
            };
            if !active {
                while let Some(item) = upstream.next().await {
                    yield item;
                }
                return;
            }

            let mut emitted_text = String::new();
            let mut original_finish: Option<String> = None;
            let mut attempts: u32 = 0;

            loop {
                let mut marker_filter = DoneMarkerFilter::new();
                let mut splicer = (attempts > 0).then(|| {
                    HeadSplicer::new(&emitted_text, config.min_overlap_chars, config.max_overlap_chars)
                });
                let mut held_terminal: Option<Value> = None;
                let mut accumulator = StreamChunkAccumulator::new();
                let mut failure = None;

                while let Some(item) = upstream.next().await {
                    let mut chunk = match item {
                        Ok(chunk) => chunk,
                        Err(err) if attempts == 0 && emitted_text.is_empty() => {
                            yield Err(err);
                            return;
                        },
                        Err(err) => {
                            tracing::warn!("⚠️ Upstream stream for {} broke mid-answer: {}", model, err);
                            failure = Some(err);
                            break;
                        },
                    };

                    // Usage trailing the terminal chunk belongs to it.
                    if let Some(held) = held_terminal.as_mut() {
                        if let (Some(usage), Some(obj)) = (chunk.get("usageMetadata"), held.as_object_mut()) {
                            obj.insert("usageMetadata".to_string(), usage.clone());
                        }
                        continue;
                    }

                    let delta = accumulator.ingest(&chunk);
                    let mut visible = if done_mode { marker_filter.push(&delta.text) } else { delta.text.clone() };

                    if delta.is_terminal() {
                        if done_mode {
                            visible.push_str(&marker_filter.finish());
                        }
                        let tail = match splicer.as_mut() {
                            Some(s) => s.push(&visible) + &s.finish(),
                            None => visible,
                        };
                        replace_candidate_text(&mut chunk, &tail);
                        emitted_text.push_str(&tail);
                        held_terminal = Some(chunk);
                        continue;
                    }

                    let out = match splicer.as_mut() {
                        Some(s) => s.push(&visible),
                        None => visible,
                    };
                    replace_candidate_text(&mut chunk, &out);
                    emitted_text.push_str(&out);
                    if has_parts(&chunk) || chunk.get("usageMetadata").is_some() {
                        yield Ok(chunk);
                    }
                }

                let Some(mut terminal) = held_terminal else {
                    // Upstream closed without a finish reason, or broke: flush
                    // what is held, then end with the error if there was one.
                    let mut rest = if done_mode { marker_filter.finish() } else { String::new() };
                    if let Some(s) = splicer.as_mut() {
                        let head = s.push(&rest);
                        rest = head + &s.finish();
                    }
                    if !rest.is_empty() {
                        emitted_text.push_str(&rest);
                        yield Ok(text_chunk(&rest));
                    }
                    if let Some(err) = failure {
                        yield Err(err);
                        return;
                    }
                    if attempts > 0 {
                        let reason = original_finish.clone().unwrap_or_else(|| "STOP".to_string());
                        yield Ok(finish_chunk(&reason));
                    }
                    return;
                };

                let finish = accumulator.finish_reason().map(str::to_string);
                let turn = TurnSummary {
                    finish_reason: finish.as_deref(),
                    has_tool_calls: accumulator.has_tool_calls(),
                    text: &emitted_text,
                    done_mode,
                    found_done_marker: marker_filter.found(),
                };
                let truncated = needs_continuation(&turn);

                if !truncated {
                    yield Ok(terminal);
                    return;
                }
                if attempts >= config.max_attempts {
                    tracing::warn!("⚠️ Continuation bound reached for {} after {} attempts", model, attempts);
                    if let Some(reason) = original_finish.as_deref().or(finish.as_deref()) {
                        set_finish_reason(&mut terminal, reason);
                    }
                    yield Ok(terminal);
                    return;
                }

                if original_finish.is_none() {
                    original_finish = finish.clone();
                }
                strip_terminal(&mut terminal);
                if has_parts(&terminal) {
                    yield Ok(terminal);
                }

                attempts += 1;
                tracing::info!(
                    "🔁 Streamed answer for {} looks truncated, continuation {}/{}",
                    model,
                    attempts,
                    config.max_attempts
                );
                let follow_up = build_continuation_request(&request, &emitted_text, done_mode);
                upstream = match caller.stream_generate(&model, &follow_up).await {
                    Ok(s) => s,
                    Err(err) => {
                        tracing::warn!("⚠️ Continuation {} failed for {}: {}", attempts, model, err);
                        let reason = original_finish.clone().unwrap_or_else(|| "STOP".to_string());
                        yield Ok(finish_chunk(&reason));
                        return;
                    },
                };
            }
        })
    }
}
