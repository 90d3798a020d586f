//! Error types for the edgequake-product2json library.
//!
//! Every variant of [`ExtractError`] aborts the request. They are grouped by
//! [`FailureStage`] so callers can tell "an input could not be read" apart
//! from "the model could not be reached" without matching on every variant.
//!
//! A model that answers with something other than JSON is *not* an error:
//! that case is recovered into [`crate::output::ExtractionOutcome::Fallback`]
//! and returned as a successful result.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-product2json library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Request errors ────────────────────────────────────────────────────
    /// Neither a document nor a URL was supplied.
    #[error("Provide either PDF document(s) or a URL")]
    InvalidRequest,

    /// The model credential was empty or whitespace.
    #[error("An API key is required (pass --api-key or set OPENAI_API_KEY)")]
    MissingCredential,

    // ── Document errors ───────────────────────────────────────────────────
    /// A document path given on the command line does not exist.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The payload does not start with the `%PDF` magic bytes.
    #[error("Document '{name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: Vec<u8> },

    /// pdfium could not parse the document.
    #[error("Document '{name}' is corrupt: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// The document is encrypted.
    #[error("Document '{name}' is encrypted and requires a password")]
    PasswordRequired { name: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium system-wide, place it next to the binary, or\n\
set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Web errors ────────────────────────────────────────────────────────
    /// The page could not be fetched or its body could not be read.
    #[error("Failed to fetch '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    /// The fetch exceeded the configured timeout.
    #[error("Fetching '{url}' timed out after {secs}s\nIncrease --fetch-timeout.")]
    FetchTimeout { url: String, secs: u64 },

    /// The server answered with a non-success status.
    #[error("Fetching '{url}' returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The provider rejected the credential (401/403).
    #[error("Authentication error from provider '{provider}': {detail}")]
    AuthError { provider: String, detail: String },

    /// The provider call failed for any other reason.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The model call exceeded the configured timeout.
    #[error("LLM call timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Which part of the pipeline an [`ExtractError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// The request itself was malformed; nothing ran.
    Request,
    /// A document or the web page could not be turned into text.
    Extraction,
    /// The model call failed.
    Structuring,
    /// Configuration or runtime problem inside the library.
    Internal,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureStage::Request => "request",
            FailureStage::Extraction => "extraction",
            FailureStage::Structuring => "structuring",
            FailureStage::Internal => "internal",
        };
        f.write_str(s)
    }
}

impl ExtractError {
    /// The pipeline stage this error aborted.
    pub fn stage(&self) -> FailureStage {
        match self {
            ExtractError::InvalidRequest | ExtractError::MissingCredential => FailureStage::Request,
            ExtractError::FileNotFound { .. }
            | ExtractError::PermissionDenied { .. }
            | ExtractError::NotAPdf { .. }
            | ExtractError::CorruptPdf { .. }
            | ExtractError::PasswordRequired { .. }
            | ExtractError::PdfiumBindingFailed(_)
            | ExtractError::FetchFailed { .. }
            | ExtractError::FetchTimeout { .. }
            | ExtractError::HttpStatus { .. } => FailureStage::Extraction,
            ExtractError::AuthError { .. }
            | ExtractError::LlmApiError { .. }
            | ExtractError::ApiTimeout { .. } => FailureStage::Structuring,
            ExtractError::InvalidConfig(_) | ExtractError::Internal(_) => FailureStage::Internal,
        }
    }

    /// Name of the document or URL that failed, for extraction failures.
    pub fn target(&self) -> Option<String> {
        match self {
            ExtractError::FileNotFound { path } | ExtractError::PermissionDenied { path } => {
                Some(path.display().to_string())
            }
            ExtractError::NotAPdf { name, .. }
            | ExtractError::CorruptPdf { name, .. }
            | ExtractError::PasswordRequired { name } => Some(name.clone()),
            ExtractError::FetchFailed { url, .. }
            | ExtractError::FetchTimeout { url, .. }
            | ExtractError::HttpStatus { url, .. } => Some(url.clone()),
            _ => None,
        }
    }
}
