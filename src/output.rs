//! Output types: the structured record, the fallback envelope and run stats.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Warning attached to every [`FallbackResult`].
pub const FALLBACK_WARNING: &str = "Could not parse as JSON.";

/// The product record the model is asked to produce.
///
/// Every field defaults to empty so a partially filled response still
/// deserialises. The pipeline itself never requires this shape; it is a
/// typed view over [`ExtractionOutcome::Structured`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredProduct {
    pub product_name: String,
    pub brand: String,
    pub price: String,
    pub materials: String,
    pub finish_options: Vec<Value>,
    pub dimensions: Map<String, Value>,
    pub bulb_info: Map<String, Value>,
    pub features: Vec<Value>,
    pub assembly: String,
    pub care: String,
    pub delivery: Map<String, Value>,
    pub related_products: Vec<Value>,
    pub reviews: Vec<Value>,
    pub product_url: String,
}

impl StructuredProduct {
    /// True when the model left every field empty.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Returned when the model's answer is not valid JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackResult {
    /// The model's response, unmodified.
    pub raw_output: String,
    pub warning: String,
}

impl FallbackResult {
    pub fn new(raw_output: impl Into<String>) -> Self {
        Self {
            raw_output: raw_output.into(),
            warning: FALLBACK_WARNING.to_string(),
        }
    }
}

/// Result of validating the model response.
///
/// Serialises untagged: either the parsed record itself or
/// `{ "raw_output": ..., "warning": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractionOutcome {
    Structured(Value),
    Fallback(FallbackResult),
}

impl ExtractionOutcome {
    pub fn is_structured(&self) -> bool {
        matches!(self, ExtractionOutcome::Structured(_))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ExtractionOutcome::Fallback(_))
    }

    /// Typed view of a structured outcome.
    ///
    /// `None` for a fallback, or when the model used types the record does
    /// not accept (e.g. a numeric `price`).
    pub fn product(&self) -> Option<StructuredProduct> {
        match self {
            ExtractionOutcome::Structured(v) => serde_json::from_value(v.clone()).ok(),
            ExtractionOutcome::Fallback(_) => None,
        }
    }
}

/// Counters and timings for one extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub documents: usize,
    /// Characters contributed by all documents.
    pub document_chars: usize,
    /// Characters contributed by the web page, after truncation.
    pub web_chars: usize,
    pub aggregated_chars: usize,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub extraction_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
    pub fallback: bool,
}

/// Complete result of [`crate::extract`].
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutput {
    pub outcome: ExtractionOutcome,
    pub stats: ExtractionStats,
}
