//! Text aggregation: one string for the model.
//!
//! Each document text is followed by a newline, in request order; the web
//! text (if any) is appended as-is. No further cleanup happens here: the
//! extractors already trimmed what they produced, and collapsing whitespace
//! would flatten the line structure of spec tables.

/// Concatenate document texts and the optional web text.
pub fn aggregate(documents: &[String], web: Option<&str>) -> String {
    let capacity = documents.iter().map(|d| d.len() + 1).sum::<usize>()
        + web.map_or(0, str::len);
    let mut out = String::with_capacity(capacity);

    for doc in documents {
        out.push_str(doc);
        out.push('\n');
    }
    if let Some(web) = web {
        out.push_str(web);
    }
    out
}
