//! Request types: what the caller hands to [`crate::extract`].
//!
//! A request bundles the raw inputs (PDF payloads and/or a URL) with the
//! caller's model credential. The credential travels with the request and is
//! dropped with it; it is never copied into [`crate::ExtractionConfig`].

use crate::error::ExtractError;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Opaque secret authorising the model call.
///
/// `Debug` is redacted so the value cannot leak through logs or panics.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw secret, for handing to the provider.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl From<String> for Credential {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Credential {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One PDF payload plus a display name used in error messages.
#[derive(Clone)]
pub struct DocumentInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl DocumentInput {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a document from disk.
    ///
    /// The file name becomes the display name. Only existence and
    /// readability are checked here; PDF validity is checked at extraction.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ExtractError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => ExtractError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => ExtractError::Internal(format!("reading {}: {e}", path.display())),
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!("Loaded document {} ({} bytes)", name, bytes.len());
        Ok(Self { name, bytes })
    }
}

impl fmt::Debug for DocumentInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentInput")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Everything one extraction needs from the caller.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub documents: Vec<DocumentInput>,
    pub url: Option<String>,
    pub credential: Credential,
}

impl ExtractionRequest {
    pub fn new(credential: impl Into<Credential>) -> Self {
        Self {
            documents: Vec::new(),
            url: None,
            credential: credential.into(),
        }
    }

    pub fn document(mut self, doc: DocumentInput) -> Self {
        self.documents.push(doc);
        self
    }

    pub fn documents(mut self, docs: impl IntoIterator<Item = DocumentInput>) -> Self {
        self.documents.extend(docs);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// The URL, if one was given and it is not blank.
    pub fn target_url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    /// Reject a request that names no input at all, or carries a blank credential.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.documents.is_empty() && self.target_url().is_none() {
            return Err(ExtractError::InvalidRequest);
        }
        if self.credential.is_empty() {
            return Err(ExtractError::MissingCredential);
        }
        Ok(())
    }
}
