//! Extract the cooldown hint from an upstream 429.

use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

static DURATION_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
static RETRY_PHRASE_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

fn duration_regex() -> Option<&'static Regex> {
    DURATION_REGEX
        .get_or_init(|| {
            Regex::new(
                r"^\s*(?:(\d+)h)?\s*(?:(\d+)m)?\s*(?:(\d+(?:\.\d+)?)s)?\s*(?:(\d+(?:\.\d+)?)ms)?\s*$",
            )
            .ok()
        })
        .as_ref()
}

fn retry_phrase_regex() -> Option<&'static Regex> {
    RETRY_PHRASE_REGEX
        .get_or_init(|| {
            Regex::new(
                r"(?i)(?:retry after|try again in|reset in|wait)\s*(\d+)\s*(?:s\b|sec|second)",
            )
            .ok()
        })
        .as_ref()
}

/// Parse Google-style durations such as `"42s"`, `"1.5s"`, `"1h2m3s"`, `"250ms"`.
pub fn parse_duration_string(s: &str) -> Option<Duration> {
    let caps = duration_regex()?.captures(s)?;
    if (1..=4).all(|i| caps.get(i).is_none()) {
        return None;
    }
    let hours = caps.get(1).and_then(|m| m.as_str().parse::<u64>().ok()).unwrap_or(0);
    let minutes = caps.get(2).and_then(|m| m.as_str().parse::<u64>().ok()).unwrap_or(0);
    let seconds = caps.get(3).and_then(|m| m.as_str().parse::<f64>().ok()).unwrap_or(0.0);
    let millis = caps.get(4).and_then(|m| m.as_str().parse::<f64>().ok()).unwrap_or(0.0);

    let total_ms = (hours * 3600 + minutes * 60) as f64 * 1000.0 + seconds * 1000.0 + millis;
    Some(Duration::from_millis(total_ms.round() as u64))
}

/// Cooldown hint from a `Retry-After` header value (seconds form only).
pub fn parse_retry_after_header(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Cooldown hint from a 429 body: `quotaResetDelay` / `retryDelay` details, then free text.
pub fn parse_retry_time_from_body(body: &str) -> Option<Duration> {
    let trimmed = body.trim();
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        let details = json.get("error").and_then(|e| e.get("details")).and_then(|d| d.as_array());
        for detail in details.into_iter().flatten() {
            let hint = detail
                .get("metadata")
                .and_then(|m| m.get("quotaResetDelay"))
                .or_else(|| detail.get("retryDelay"))
                .and_then(|v| v.as_str());
            if let Some(delay) = hint.and_then(parse_duration_string) {
                tracing::debug!("Upstream reset hint: {:?}", delay);
                return Some(delay);
            }
        }
    }

    let caps = retry_phrase_regex()?.captures(body)?;
    caps.get(1)?.as_str().parse::<u64>().ok().map(Duration::from_secs)
}
