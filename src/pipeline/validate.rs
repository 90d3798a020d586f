//! Response validation: JSON when possible, a fallback envelope otherwise.
//!
//! Any syntactically valid JSON value is accepted; field presence is not
//! checked. Models sometimes wrap the object in a ```json fence despite the
//! prompt, so a single outer fence is tolerated. Anything else becomes
//! [`ExtractionOutcome::Fallback`] carrying the response verbatim, so the
//! caller can still use the text by hand.

use crate::output::{ExtractionOutcome, FallbackResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?[ \t]*\r?\n(.*?)\r?\n?```$").unwrap());

/// Parse the raw model response. Never fails.
pub fn validate(raw: &str) -> ExtractionOutcome {
    match parse_json(raw) {
        Some(value) => {
            debug!("Model response parsed as JSON");
            ExtractionOutcome::Structured(value)
        }
        None => {
            warn!("Model response is not JSON ({} chars); returning raw output", raw.len());
            ExtractionOutcome::Fallback(FallbackResult::new(raw))
        }
    }
}

fn parse_json(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(raw) {
        return Some(value);
    }
    let caps = RE_OUTER_FENCE.captures(raw.trim())?;
    serde_json::from_str(&caps[1]).ok()
}
