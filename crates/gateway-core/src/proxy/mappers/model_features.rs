//! Feature markers carried in the requested model name.
//!
//! `流式抗截断/gemini-2.5-pro-maxthinking-search` asks for done-marker
//! anti-truncation, a maximal thinking budget and the search tool; the
//! upstream only ever sees `gemini-2.5-pro`. `假流式/` instead asks for a
//! streamed answer built from one non-streaming upstream call.

use serde_json::{json, Value};

pub const ANTI_TRUNCATION_PREFIX: &str = "流式抗截断/";
pub const ANTI_TRUNCATION_PREFIX_ASCII: &str = "anti-truncation/";
pub const FAKE_STREAM_PREFIX: &str = "假流式/";
pub const FAKE_STREAM_PREFIX_ASCII: &str = "fake-stream/";
const SEARCH_SUFFIX: &str = "-search";
const MAX_THINKING_SUFFIX: &str = "-maxthinking";
const NO_THINKING_SUFFIX: &str = "-nothinking";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThinkingMode {
    #[default]
    Default,
    Max,
    Off,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFeatures {
    /// Name sent upstream and used as the cooldown key
    pub base_model: String,
    pub search: bool,
    pub thinking: ThinkingMode,
    /// Done-marker anti-truncation requested through the prefix
    pub anti_truncation: bool,
    /// Streamed requests are served from one non-streaming call
    pub fake_stream: bool,
}

impl ModelFeatures {
    pub fn parse(requested: &str) -> Self {
        let mut name = requested.trim().trim_start_matches("models/");
        let mut anti_truncation = false;
        let mut fake_stream = false;
        // The two prefixes are exclusive; only one is stripped.
        for (prefix, is_fake) in [
            (ANTI_TRUNCATION_PREFIX, false),
            (ANTI_TRUNCATION_PREFIX_ASCII, false),
            (FAKE_STREAM_PREFIX, true),
            (FAKE_STREAM_PREFIX_ASCII, true),
        ] {
            if let Some(rest) = name.strip_prefix(prefix) {
                name = rest;
                fake_stream = is_fake;
                anti_truncation = !is_fake;
                break;
            }
        }

        let mut search = false;
        if let Some(rest) = name.strip_suffix(SEARCH_SUFFIX) {
            name = rest;
            search = true;
        }

        let mut thinking = ThinkingMode::Default;
        if let Some(rest) = name.strip_suffix(MAX_THINKING_SUFFIX) {
            name = rest;
            thinking = ThinkingMode::Max;
        } else if let Some(rest) = name.strip_suffix(NO_THINKING_SUFFIX) {
            name = rest;
            thinking = ThinkingMode::Off;
        }

        Self { base_model: name.to_string(), search, thinking, anti_truncation, fake_stream }
    }

    fn is_flash(&self) -> bool {
        self.base_model.contains("flash")
    }

    /// `thinkingConfig` implied by the suffix, if any.
    pub fn thinking_config(&self) -> Option<Value> {
        match self.thinking {
            ThinkingMode::Default => None,
            ThinkingMode::Max => {
                let budget = if self.is_flash() { 24576 } else { 32768 };
                Some(json!({ "thinkingBudget": budget, "includeThoughts": true }))
            },
            ThinkingMode::Off => {
                let budget = if self.base_model.contains("pro") { 128 } else { 0 };
                Some(json!({ "thinkingBudget": budget, "includeThoughts": false }))
            },
        }
    }

    /// Apply thinking and search markers to a native request body.
    pub fn apply_to_native(&self, body: &mut Value) {
        if let Some(thinking) = self.thinking_config() {
            if let Some(obj) = body.as_object_mut() {
                let gen = obj.entry("generationConfig").or_insert_with(|| json!({}));
                if gen.is_object() {
                    gen["thinkingConfig"] = thinking;
                }
            }
        }
        if self.search {
            super::grounding::inject_google_search_tool(body);
        }
    }
}

/// Every advertised name: base, thinking and search suffixes, their
/// combinations, and each of those behind the fake-stream and
/// anti-truncation prefixes.
pub fn list_model_variants(base_models: &[String]) -> Vec<String> {
    let mut names = Vec::new();
    for base in base_models {
        let mut variants = vec![base.clone()];
        for thinking in [MAX_THINKING_SUFFIX, NO_THINKING_SUFFIX] {
            variants.push(format!("{base}{thinking}"));
        }
        variants.push(format!("{base}{SEARCH_SUFFIX}"));
        for thinking in [MAX_THINKING_SUFFIX, NO_THINKING_SUFFIX] {
            variants.push(format!("{base}{thinking}{SEARCH_SUFFIX}"));
        }
        let prefixed: Vec<String> = [FAKE_STREAM_PREFIX, ANTI_TRUNCATION_PREFIX]
            .iter()
            .flat_map(|prefix| variants.iter().map(move |v| format!("{prefix}{v}")))
            .collect();
        names.extend(variants);
        names.extend(prefixed);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_markers() {
        let features = ModelFeatures::parse("流式抗截断/gemini-2.5-pro-maxthinking-search");
        assert_eq!(features.base_model, "gemini-2.5-pro");
        assert!(features.search);
        assert!(features.anti_truncation);
        assert_eq!(features.thinking, ThinkingMode::Max);
    }

    #[test]
    fn test_plain_model() {
        let features = ModelFeatures::parse("models/gemini-2.5-flash");
        assert_eq!(features.base_model, "gemini-2.5-flash");
        assert!(!features.search && !features.anti_truncation && !features.fake_stream);
        assert_eq!(features.thinking_config(), None);
    }

    #[test]
    fn test_thinking_budgets() {
        let flash = ModelFeatures::parse("gemini-2.5-flash-maxthinking");
        assert_eq!(flash.thinking_config().map(|c| c["thinkingBudget"].clone()), Some(json!(24576)));
        let pro = ModelFeatures::parse("gemini-2.5-pro-maxthinking");
        assert_eq!(pro.thinking_config().map(|c| c["thinkingBudget"].clone()), Some(json!(32768)));
        let pro_off = ModelFeatures::parse("gemini-2.5-pro-nothinking");
        assert_eq!(pro_off.thinking_config().map(|c| c["thinkingBudget"].clone()), Some(json!(128)));
        let flash_off = ModelFeatures::parse("anti-truncation/gemini-2.5-flash-nothinking");
        assert!(flash_off.anti_truncation);
        assert_eq!(flash_off.thinking_config().map(|c| c["thinkingBudget"].clone()), Some(json!(0)));
    }

    #[test]
    fn test_variant_listing() {
        let names = list_model_variants(&["gemini-2.5-pro".to_string()]);
        assert_eq!(names.len(), 18);
        assert!(names.contains(&"gemini-2.5-pro-nothinking-search".to_string()));
        assert!(names.contains(&"流式抗截断/gemini-2.5-pro-search".to_string()));
        assert!(names.contains(&"假流式/gemini-2.5-pro-maxthinking".to_string()));
        for name in &names {
            assert_eq!(ModelFeatures::parse(name).base_model, "gemini-2.5-pro");
        }
    }

    #[test]
    fn test_fake_stream_prefix() {
        for name in ["假流式/gemini-2.5-flash-search", "fake-stream/gemini-2.5-flash-search"] {
            let features = ModelFeatures::parse(name);
            assert_eq!(features.base_model, "gemini-2.5-flash");
            assert!(features.fake_stream);
            assert!(!features.anti_truncation);
            assert!(features.search);
        }
    }
}
