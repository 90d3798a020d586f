//! # edgequake-product2json
//!
//! Turn product spec sheets (PDF) and product pages (HTML) into a structured
//! JSON record with a single language-model call.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDFs + URL + credential
//!  │
//!  ├─ 1. Extract    pdfium page text / visible HTML text (≤ 10 000 chars)
//!  ├─ 2. Aggregate  documents in order, then the web text
//!  ├─ 3. Structure  one chat completion with the product-schema prompt
//!  └─ 4. Validate   parsed JSON, or { raw_output, warning } on failure
//! ```
//!
//! Bad inputs and unreachable models are errors ([`ExtractError`]). A model
//! answer that is not JSON is *not* an error: it comes back as
//! [`ExtractionOutcome::Fallback`] so the text is never lost.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_product2json::{extract, DocumentInput, ExtractionConfig, ExtractionRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = ExtractionRequest::new(std::env::var("OPENAI_API_KEY")?)
//!         .document(DocumentInput::from_path("lamp-spec.pdf").await?)
//!         .url("https://shop.example/lamp-x");
//!
//!     let output = extract(request, &ExtractionConfig::default()).await?;
//!     println!("{}", serde_json::to_string_pretty(&output.outcome)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `product2json` binary (clap + anyhow + tracing-subscriber) |
//!
//! PDF extraction needs a pdfium shared library at runtime: set
//! `PDFIUM_LIB_PATH`, place it in the working directory, or install it on the
//! system library path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod request;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{ExtractError, FailureStage};
pub use extract::{extract, extract_sync};
pub use output::{
    ExtractionOutcome, ExtractionOutput, ExtractionStats, FallbackResult, StructuredProduct,
};
pub use pipeline::llm::{Completion, CompletionBackend, OpenAiBackend};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, PipelineStage, ProgressCallback};
pub use request::{Credential, DocumentInput, ExtractionRequest};
