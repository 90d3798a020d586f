//! Extraction entry points.
//!
//! [`extract`] drives one request through the pipeline:
//!
//! ```text
//! Idle → Extracting → Aggregating → Structuring → Validating → Done
//! ```
//!
//! Documents and the web page are extracted concurrently. Document results
//! keep request order whatever order they finish in. The first extraction
//! failure aborts the request (fail-fast); no partial text is sent to the
//! model.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::output::{ExtractionOutput, ExtractionStats};
use crate::pipeline::llm::{self, CompletionBackend, OpenAiBackend};
use crate::pipeline::{aggregate, document, validate, web};
use crate::progress::{ExtractionProgressCallback, PipelineStage};
use crate::request::{DocumentInput, ExtractionRequest};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Extract a structured product record from PDFs and/or a web page.
///
/// # Returns
/// `Ok(ExtractionOutput)` whenever the model answered, including when its
/// answer was not JSON (`output.outcome` is then a fallback envelope).
///
/// # Errors
/// - [`ExtractError::InvalidRequest`] if neither documents nor a URL were
///   given; nothing else runs.
/// - An extraction error naming the document or URL that failed.
/// - A structuring error if the model call failed.
pub async fn extract(
    request: ExtractionRequest,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let progress = config.progress_callback.as_deref();
    if let Some(cb) = progress {
        cb.on_stage(PipelineStage::Idle);
    }

    let result = run(request, config, progress).await;

    if let Some(cb) = progress {
        match &result {
            Ok(output) => cb.on_complete(&output.outcome),
            Err(e) => cb.on_failed(e),
        }
    }
    result
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    request: ExtractionRequest,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(request, config))
}

async fn run(
    request: ExtractionRequest,
    config: &ExtractionConfig,
    progress: Option<&dyn ExtractionProgressCallback>,
) -> Result<ExtractionOutput, ExtractError> {
    let total_start = Instant::now();
    request.validate()?;

    let url = request.target_url().map(str::to_string);
    let ExtractionRequest {
        documents,
        credential,
        ..
    } = request;
    info!(
        "Starting extraction: {} document(s){}",
        documents.len(),
        url.as_deref().map(|u| format!(", url {u}")).unwrap_or_default()
    );

    // ── Step 1: Extract text ─────────────────────────────────────────────
    stage(progress, PipelineStage::Extracting);
    let extract_start = Instant::now();
    let document_count = documents.len();
    let (doc_texts, web_text) = futures::try_join!(
        extract_documents(documents, config, progress),
        extract_web(url.as_deref(), config, progress),
    )?;
    let extraction_duration_ms = extract_start.elapsed().as_millis() as u64;

    // ── Step 2: Aggregate ────────────────────────────────────────────────
    stage(progress, PipelineStage::Aggregating);
    let text = aggregate::aggregate(&doc_texts, web_text.as_deref());
    debug!("Aggregated {} chars", text.chars().count());

    // ── Step 3: Structure ────────────────────────────────────────────────
    stage(progress, PipelineStage::Structuring);
    let backend = resolve_backend(config);
    let llm_start = Instant::now();
    let completion = llm::structure(backend.as_ref(), &text, &credential, config).await?;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    // ── Step 4: Validate ─────────────────────────────────────────────────
    stage(progress, PipelineStage::Validating);
    let outcome = validate::validate(&completion.content);
    stage(progress, PipelineStage::Done);

    let stats = ExtractionStats {
        documents: document_count,
        document_chars: doc_texts.iter().map(|t| t.chars().count()).sum(),
        web_chars: web_text.as_deref().map_or(0, |t| t.chars().count()),
        aggregated_chars: text.chars().count(),
        prompt_tokens: completion.prompt_tokens,
        completion_tokens: completion.completion_tokens,
        extraction_duration_ms,
        llm_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        fallback: outcome.is_fallback(),
    };

    info!(
        "Extraction complete: {} in {}ms",
        if stats.fallback { "fallback" } else { "structured" },
        stats.total_duration_ms
    );

    Ok(ExtractionOutput { outcome, stats })
}

fn stage(progress: Option<&dyn ExtractionProgressCallback>, stage: PipelineStage) {
    debug!("Stage: {}", stage);
    if let Some(cb) = progress {
        cb.on_stage(stage);
    }
}

/// Extract every document, at most `config.concurrency` at once, in order.
async fn extract_documents(
    documents: Vec<DocumentInput>,
    config: &ExtractionConfig,
    progress: Option<&dyn ExtractionProgressCallback>,
) -> Result<Vec<String>, ExtractError> {
    stream::iter(documents.into_iter().enumerate().map(|(index, doc)| async move {
        let name = doc.name.clone();
        let text = document::extract_document(doc).await?;
        if let Some(cb) = progress {
            cb.on_document_extracted(index, &name, text.chars().count());
        }
        Ok::<_, ExtractError>(text)
    }))
    .buffered(config.concurrency.max(1))
    .try_collect()
    .await
}

async fn extract_web(
    url: Option<&str>,
    config: &ExtractionConfig,
    progress: Option<&dyn ExtractionProgressCallback>,
) -> Result<Option<String>, ExtractError> {
    let Some(url) = url else {
        return Ok(None);
    };
    let text = web::extract_url(url, config).await?;
    if let Some(cb) = progress {
        cb.on_web_extracted(url, text.chars().count());
    }
    Ok(Some(text))
}

/// The configured backend, or an OpenAI backend for `config.model`.
fn resolve_backend(config: &ExtractionConfig) -> Arc<dyn CompletionBackend> {
    match config.backend {
        Some(ref backend) => Arc::clone(backend),
        None => Arc::new(OpenAiBackend::new(config.model.clone())),
    }
}
