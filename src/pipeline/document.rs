//! PDF text extraction via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is CPU-bound while walking page content. Running it on the
//! blocking pool keeps Tokio worker threads free for the page fetch and the
//! model call of other requests.
//!
//! ## Output shape
//!
//! Page texts are joined with `\n` in page order and the whole result is
//! trimmed. A page with no readable text still contributes an empty segment,
//! so the number of separators always reflects the page count.

use crate::error::ExtractError;
use crate::request::DocumentInput;
use pdfium_render::prelude::*;
use tracing::{debug, info, warn};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Extract the text of one PDF document.
pub async fn extract_document(doc: DocumentInput) -> Result<String, ExtractError> {
    check_magic(&doc)?;

    let name = doc.name.clone();
    tokio::task::spawn_blocking(move || extract_document_blocking(&doc))
        .await
        .map_err(|e| ExtractError::Internal(format!("Extraction task for '{name}' panicked: {e}")))?
}

/// Reject payloads that do not start with `%PDF` before pdfium sees them.
pub fn check_magic(doc: &DocumentInput) -> Result<(), ExtractError> {
    if doc.bytes.len() < PDF_MAGIC.len() || &doc.bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        let magic = doc.bytes.iter().take(PDF_MAGIC.len()).copied().collect();
        return Err(ExtractError::NotAPdf {
            name: doc.name.clone(),
            magic,
        });
    }
    Ok(())
}

/// Join per-page texts with newlines and trim the result.
pub fn join_pages<I>(pages: I) -> String
where
    I: IntoIterator<Item = String>,
{
    pages
        .into_iter()
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Blocking implementation of text extraction.
fn extract_document_blocking(doc: &DocumentInput) -> Result<String, ExtractError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(&doc.bytes, None)
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                ExtractError::PasswordRequired {
                    name: doc.name.clone(),
                }
            } else {
                ExtractError::CorruptPdf {
                    name: doc.name.clone(),
                    detail: err_str,
                }
            }
        })?;

    let pages = document.pages();
    info!("{}: {} pages", doc.name, pages.len());

    let mut texts = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let page_text = match page.text() {
            Ok(text) => text.all(),
            Err(e) => {
                warn!("{}: page {} has no readable text: {:?}", doc.name, idx + 1, e);
                String::new()
            }
        };
        texts.push(page_text);
    }

    let text = join_pages(texts);
    debug!("{}: extracted {} chars", doc.name, text.chars().count());
    Ok(text)
}

/// Bind to pdfium: `PDFIUM_LIB_PATH`, then the working directory, then the
/// system library search path.
fn bind_pdfium() -> Result<Pdfium, ExtractError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ExtractError::PdfiumBindingFailed(e.to_string()))?;

    Ok(Pdfium::new(bindings))
}
