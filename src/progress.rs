//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to observe a
//! request as it moves through the pipeline:
//!
//! ```text
//! Idle → Extracting → Aggregating → Structuring → Validating → Done
//! ```
//!
//! Each stage is entered at most once. A failure ends the run before
//! `Validating` and is reported through [`ExtractionProgressCallback::on_failed`].
//!
//! # Example
//!
//! ```rust
//! use edgequake_product2json::{ExtractionConfig, ExtractionProgressCallback, PipelineStage};
//! use std::sync::Arc;
//!
//! struct StageLogger;
//!
//! impl ExtractionProgressCallback for StageLogger {
//!     fn on_stage(&self, stage: PipelineStage) {
//!         eprintln!("→ {stage}");
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(StageLogger) as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::ExtractError;
use crate::output::ExtractionOutcome;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Pipeline states, in the order a request visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Extracting,
    Aggregating,
    Structuring,
    Validating,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Extracting => "extracting",
            PipelineStage::Aggregating => "aggregating",
            PipelineStage::Structuring => "structuring",
            PipelineStage::Validating => "validating",
            PipelineStage::Done => "done",
        };
        f.write_str(s)
    }
}

/// Called by the pipeline as a request progresses.
///
/// Implementations must be `Send + Sync`: document extraction runs
/// concurrently, so `on_document_extracted` may arrive from several tasks.
/// All methods default to no-ops.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called on entry to each stage.
    fn on_stage(&self, stage: PipelineStage) {
        let _ = stage;
    }

    /// Called when one document has been turned into text.
    ///
    /// # Arguments
    /// * `index` — 0-based position of the document in the request
    /// * `name`  — display name of the document
    /// * `chars` — characters of text extracted
    fn on_document_extracted(&self, index: usize, name: &str, chars: usize) {
        let _ = (index, name, chars);
    }

    /// Called when the web page has been fetched and reduced to text.
    fn on_web_extracted(&self, url: &str, chars: usize) {
        let _ = (url, chars);
    }

    /// Called once with the final outcome.
    fn on_complete(&self, outcome: &ExtractionOutcome) {
        let _ = outcome;
    }

    /// Called once when the request aborts.
    fn on_failed(&self, error: &ExtractError) {
        let _ = error;
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;
