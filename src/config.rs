//! Configuration types for product extraction.
//!
//! All tunable behaviour lives in [`ExtractionConfig`], built via
//! [`ExtractionConfigBuilder`]. The config holds no secrets: the model
//! credential arrives with each [`crate::ExtractionRequest`] so one config can
//! be shared across requests from different callers.

use crate::error::ExtractError;
use crate::pipeline::llm::CompletionBackend;
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Default cap on web-page text forwarded to the model, in characters.
pub const DEFAULT_WEB_TEXT_LIMIT: usize = 10_000;

/// Browser-like User-Agent sent with page fetches.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Configuration for an extraction.
///
/// # Example
/// ```rust
/// use edgequake_product2json::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gpt-4.1-mini")
///     .temperature(0.0)
///     .web_text_limit(8_000)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Model identifier passed to the backend. Default: "gpt-4".
    pub model: String,

    /// Sampling temperature. Default: 0.2.
    ///
    /// Kept low so repeated runs over the same text give similar records.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 2048.
    pub max_tokens: usize,

    /// Custom system prompt. If None, uses [`crate::prompts::PRODUCT_EXTRACTION_PROMPT`].
    pub system_prompt: Option<String>,

    /// Maximum characters of web text forwarded to the model. Default: 10 000.
    pub web_text_limit: usize,

    /// User-Agent header for page fetches.
    pub user_agent: String,

    /// Page fetch timeout in seconds. Default: 30.
    pub fetch_timeout_secs: u64,

    /// Model call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Documents extracted at once. Default: 4.
    pub concurrency: usize,

    /// Model backend. If None, an OpenAI backend is used.
    pub backend: Option<Arc<dyn CompletionBackend>>,

    /// Optional stage-event observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.2,
            max_tokens: 2048,
            system_prompt: None,
            web_text_limit: DEFAULT_WEB_TEXT_LIMIT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout_secs: 30,
            api_timeout_secs: 60,
            concurrency: 4,
            backend: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("web_text_limit", &self.web_text_limit)
            .field("user_agent", &self.user_agent)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn CompletionBackend>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl fmt::Debug for ExtractionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn web_text_limit(mut self, chars: usize) -> Self {
        self.config.web_text_limit = chars;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(ExtractError::InvalidConfig("Model must not be empty".into()));
        }
        if c.web_text_limit == 0 {
            return Err(ExtractError::InvalidConfig(
                "Web text limit must be ≥ 1 character".into(),
            ));
        }
        if c.fetch_timeout_secs == 0 || c.api_timeout_secs == 0 {
            return Err(ExtractError::InvalidConfig("Timeouts must be ≥ 1s".into()));
        }
        if c.max_tokens == 0 {
            return Err(ExtractError::InvalidConfig("Max tokens must be ≥ 1".into()));
        }
        if c.concurrency == 0 {
            return Err(ExtractError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}
