//! Pipeline stages for product extraction.
//!
//! Each submodule implements exactly one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! document ─┐
//!           ├──▶ aggregate ──▶ llm ──▶ validate
//! web ──────┘
//! (pdfium)   (scraper)   (one call)  (JSON | fallback)
//! ```
//!
//! 1. [`document`]  — PDF bytes to page-joined text; runs in `spawn_blocking`
//! 2. [`web`]       — fetch a URL, keep visible text, cap its length
//! 3. [`aggregate`] — concatenate everything in request order
//! 4. [`llm`]       — the single model call, behind [`llm::CompletionBackend`]
//! 5. [`validate`]  — parse the response or wrap it in a fallback envelope

pub mod aggregate;
pub mod document;
pub mod llm;
pub mod validate;
pub mod web;
