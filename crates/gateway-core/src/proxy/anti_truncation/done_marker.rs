//! `[done]` marker handling for anti-truncation model variants.

use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;

pub const DONE_MARKER: &str = "[done]";

const DONE_INSTRUCTION: &str = "When your answer is completely finished, output [done] on its own \
final line. The [done] marker means the answer is complete; never output it before the end.";

static DONE_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

fn done_regex() -> Option<&'static Regex> {
    DONE_REGEX.get_or_init(|| Regex::new(r"(?i)\s*\[done\]\s*").ok()).as_ref()
}

/// Append the marker instruction to `systemInstruction` unless one is already there.
pub fn ensure_done_instruction(body: &mut Value) {
    let Some(obj) = body.as_object_mut() else {
        return;
    };
    let instruction = obj.entry("systemInstruction").or_insert_with(|| json!({ "parts": [] }));
    if !instruction.get("parts").is_some_and(Value::is_array) {
        instruction["parts"] = json!([]);
    }
    let Some(parts) = instruction.get_mut("parts").and_then(|p| p.as_array_mut()) else {
        return;
    };
    let present = parts.iter().any(|p| {
        p.get("text")
            .and_then(|t| t.as_str())
            .is_some_and(|t| t.to_ascii_lowercase().contains(DONE_MARKER))
    });
    if !present {
        parts.push(json!({ "text": DONE_INSTRUCTION }));
    }
}

/// Remove every marker (and its surrounding whitespace). Returns whether one was found.
pub fn strip_done_marker(text: &str) -> (String, bool) {
    let Some(re) = done_regex() else {
        return (text.to_string(), false);
    };
    if !re.is_match(text) {
        return (text.to_string(), false);
    }
    (re.replace_all(text, "").into_owned(), true)
}

/// Streaming marker stripper. A trailing fragment that could still grow
/// into the marker is held back until the next push.
#[derive(Debug, Default)]
pub struct DoneMarkerFilter {
    pending: String,
    found: bool,
}

impl DoneMarkerFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn found(&self) -> bool {
        self.found
    }

    pub fn push(&mut self, text: &str) -> String {
        self.pending.push_str(text);
        let (clean, found) = strip_marker_only(&self.pending);
        self.found |= found;
        let hold = partial_marker_suffix(&clean);
        let split = clean.len() - hold;
        self.pending = clean[split..].to_string();
        clean[..split].to_string()
    }

    pub fn finish(&mut self) -> String {
        std::mem::take(&mut self.pending)
    }
}

fn strip_marker_only(text: &str) -> (String, bool) {
    let lower = text.to_ascii_lowercase();
    if !lower.contains(DONE_MARKER) {
        return (text.to_string(), false);
    }
    // ASCII lowercasing keeps byte offsets aligned.
    let mut out = String::with_capacity(text.len());
    let mut rest = 0;
    for (pos, _) in lower.match_indices(DONE_MARKER) {
        out.push_str(&text[rest..pos]);
        rest = pos + DONE_MARKER.len();
    }
    out.push_str(&text[rest..]);
    (out, true)
}

/// Byte length of the longest suffix of `text` that is a proper prefix of the marker.
fn partial_marker_suffix(text: &str) -> usize {
    let marker = DONE_MARKER.as_bytes();
    let bytes = text.as_bytes();
    (1..marker.len())
        .rev()
        .find(|&n| n <= bytes.len() && bytes[bytes.len() - n..].eq_ignore_ascii_case(&marker[..n]))
        .unwrap_or(0)
}
