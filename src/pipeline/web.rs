//! Web page text extraction: fetch a URL and keep only human-visible text.
//!
//! Text nodes are dropped when any ancestor is one of [`HIDDEN_ELEMENTS`],
//! so a `<span>` nested inside a `<script>` template is excluded too.
//! Surviving fragments are trimmed and joined with a single space, and the
//! result is cut to the configured number of characters.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use scraper::Html;
use std::time::Duration;
use tracing::{debug, info};

/// Elements whose text never reaches the model.
///
/// `noscript` bodies are parsed as raw text when scripting is on, so their
/// markup would otherwise come through as literal tags.
pub const HIDDEN_ELEMENTS: [&str; 5] = ["style", "script", "head", "meta", "noscript"];

/// Fetch `url` and return its visible text, capped at `config.web_text_limit`.
///
/// A non-success status is a failure: the text of an error page is not
/// product information.
pub async fn extract_url(url: &str, config: &ExtractionConfig) -> Result<String, ExtractError> {
    info!("Fetching product page: {}", url);
    let html = fetch_html(url, config).await?;
    let text = visible_text(&html, config.web_text_limit);
    debug!("{}: {} visible chars", url, text.chars().count());
    Ok(text)
}

/// GET the page with a browser-like User-Agent.
async fn fetch_html(url: &str, config: &ExtractionConfig) -> Result<String, ExtractError> {
    let secs = config.fetch_timeout_secs;
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(secs))
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| ExtractError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| request_error(url, secs, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExtractError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| request_error(url, secs, e))
}

fn request_error(url: &str, secs: u64, e: reqwest::Error) -> ExtractError {
    if e.is_timeout() {
        ExtractError::FetchTimeout {
            url: url.to_string(),
            secs,
        }
    } else {
        ExtractError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

/// Visible text of an HTML document, truncated to `limit` characters.
pub fn visible_text(html: &str, limit: usize) -> String {
    let document = Html::parse_document(html);

    let fragments: Vec<&str> = document
        .tree
        .nodes()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
            });
            if hidden {
                return None;
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then_some(trimmed)
        })
        .collect();

    truncate_chars(&fragments.join(" "), limit)
}

/// Keep at most `limit` characters (not bytes) of `s`.
pub fn truncate_chars(s: &str, limit: usize) -> String {
    match s.char_indices().nth(limit) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}
