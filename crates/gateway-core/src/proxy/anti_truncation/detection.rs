//! Premature-stop heuristics. False positives cost one extra call; false
//! negatives leave a short answer. Neither is a correctness failure.

use gateway_types::protocol::{map_finish_reason, FinishReason};

const CLOSING_CHARS: &[char] = &['.', '!', '?', '。', '！', '？', '"', '\'', ')', ']', '}', '”', '’', '）', '】', '`'];

/// Balanced code fences and terminal punctuation at the end.
pub fn looks_structurally_closed(text: &str) -> bool {
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.matches("```").count() % 2 != 0 {
        return false;
    }
    trimmed.ends_with(CLOSING_CHARS)
}

/// What the engine knows about one finished upstream turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnSummary<'a> {
    /// Raw native finish reason
    pub finish_reason: Option<&'a str>,
    pub has_tool_calls: bool,
    /// Visible answer so far, markers already removed
    pub text: &'a str,
    pub done_mode: bool,
    pub found_done_marker: bool,
}

pub fn needs_continuation(turn: &TurnSummary<'_>) -> bool {
    if turn.has_tool_calls {
        return false;
    }
    if turn.done_mode {
        return !turn.found_done_marker;
    }
    match turn.finish_reason.map(map_finish_reason) {
        Some(FinishReason::Length) => true,
        Some(FinishReason::ContentFilter) => !looks_structurally_closed(turn.text),
        _ => false,
    }
}
