//! Structuring call: aggregated text in, raw model response out.
//!
//! The model sits behind [`CompletionBackend`], a narrow boundary taking the
//! prepared messages plus the caller's credential and returning text. The
//! default [`OpenAiBackend`] builds a fresh provider from the credential on
//! every call, so no key is ever stored in shared state.
//!
//! Exactly one call is made per request. There is no retry: a failed call is
//! reported as a structuring failure and the caller decides what to do.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::prompts::PRODUCT_EXTRACTION_PROMPT;
use crate::request::Credential;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, OpenAIProvider};
use futures::future::BoxFuture;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Model response plus token usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

impl Completion {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// A language model that can answer a chat request.
pub trait CompletionBackend: Send + Sync {
    /// Provider name used in logs and auth errors.
    fn name(&self) -> &str;

    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        options: &'a CompletionOptions,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<Completion, ExtractError>>;
}

/// OpenAI chat completions via `edgequake-llm`.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    model: String,
}

impl OpenAiBackend {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        options: &'a CompletionOptions,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<Completion, ExtractError>> {
        Box::pin(async move {
            let provider =
                OpenAIProvider::new(credential.expose().to_string()).with_model(&self.model);

            let response = provider
                .chat(messages, Some(options))
                .await
                .map_err(|e| classify_provider_error(self.name(), &e.to_string()))?;

            Ok(Completion {
                content: response.content,
                prompt_tokens: response.prompt_tokens as usize,
                completion_tokens: response.completion_tokens as usize,
            })
        })
    }
}

/// Map a provider error message onto the auth / generic split.
pub fn classify_provider_error(provider: &str, message: &str) -> ExtractError {
    let lower = message.to_lowercase();
    let is_auth = lower.contains("401")
        || lower.contains("403")
        || lower.contains("unauthorized")
        || lower.contains("invalid api key")
        || lower.contains("incorrect api key")
        || lower.contains("authentication");

    if is_auth {
        ExtractError::AuthError {
            provider: provider.to_string(),
            detail: message.to_string(),
        }
    } else {
        ExtractError::LlmApiError {
            message: message.to_string(),
        }
    }
}

/// Send `text` to the model with the product-extraction prompt.
///
/// ## Message Layout
///
/// 1. **System message** — the schema prompt (or the configured override)
/// 2. **User message** — the aggregated text, unmodified
///
/// The response content is returned exactly as received.
pub async fn structure(
    backend: &dyn CompletionBackend,
    text: &str,
    credential: &Credential,
    config: &ExtractionConfig,
) -> Result<Completion, ExtractError> {
    let start = Instant::now();
    let messages = build_messages(text, config);
    let options = build_options(config);
    let secs = config.api_timeout_secs;

    let call = backend.complete(&messages, &options, credential);
    let completion = match tokio::time::timeout(Duration::from_secs(secs), call).await {
        Ok(Ok(completion)) => completion,
        Ok(Err(e)) => {
            warn!("{}: structuring call failed — {}", backend.name(), e);
            return Err(e);
        }
        Err(_) => {
            warn!("{}: structuring call timed out after {}s", backend.name(), secs);
            return Err(ExtractError::ApiTimeout { secs });
        }
    };

    debug!(
        "{}: {} input tokens, {} output tokens, {:?}",
        backend.name(),
        completion.prompt_tokens,
        completion.completion_tokens,
        start.elapsed()
    );
    Ok(completion)
}

/// System prompt followed by the aggregated text as the user turn.
fn build_messages(text: &str, config: &ExtractionConfig) -> Vec<ChatMessage> {
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(PRODUCT_EXTRACTION_PROMPT);

    vec![ChatMessage::system(system_prompt), ChatMessage::user(text)]
}

/// Build `CompletionOptions` from the extraction config.
fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
