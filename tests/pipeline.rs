//! End-to-end pipeline tests.
//!
//! The model is replaced by a scripted [`CompletionBackend`] and product
//! pages are served by a one-shot local HTTP responder, so these run
//! offline. Tests that need a pdfium library are gated behind the
//! `PDFIUM_TESTS` environment variable.
//!
//! Run with:
//!   cargo test --test pipeline
//!   PDFIUM_TESTS=1 PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test pipeline

use edgequake_llm::{ChatMessage, CompletionOptions};
use edgequake_product2json::{
    extract, Completion, CompletionBackend, Credential, DocumentInput, ExtractError,
    ExtractionConfig, ExtractionOutcome, ExtractionProgressCallback, ExtractionRequest,
    FailureStage, PipelineStage,
};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const LAMP_X: &str = r#"{"product_name": "Lamp X", "brand": "", "price": "", "materials": "", "finish_options": [], "dimensions": {}, "bulb_info": {}, "features": [], "assembly": "", "care": "", "delivery": {}, "related_products": [], "reviews": [], "product_url": ""}"#;

// ── Test helpers ─────────────────────────────────────────────────────────────

enum Reply {
    Text(&'static str),
    AuthFailure,
}

/// Backend that answers from a script and remembers what it was sent.
struct Scripted {
    reply: Reply,
    calls: AtomicUsize,
    user_text: Mutex<Option<String>>,
    credential: Mutex<Option<String>>,
}

impl Scripted {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            user_text: Mutex::new(None),
            credential: Mutex::new(None),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn user_text(&self) -> String {
        self.user_text.lock().unwrap().clone().unwrap_or_default()
    }
}

impl CompletionBackend for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        _options: &'a CompletionOptions,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<Completion, ExtractError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.user_text.lock().unwrap() = messages.last().map(|m| m.content.clone());
            *self.credential.lock().unwrap() = Some(credential.expose().to_string());
            match self.reply {
                Reply::Text(text) => Ok(Completion {
                    content: text.to_string(),
                    prompt_tokens: 120,
                    completion_tokens: 40,
                }),
                Reply::AuthFailure => Err(ExtractError::AuthError {
                    provider: "scripted".into(),
                    detail: "invalid api key".into(),
                }),
            }
        })
    }
}

#[derive(Default)]
struct StageRecorder {
    stages: Mutex<Vec<PipelineStage>>,
    failures: AtomicUsize,
    completions: AtomicUsize,
}

impl ExtractionProgressCallback for StageRecorder {
    fn on_stage(&self, stage: PipelineStage) {
        self.stages.lock().unwrap().push(stage);
    }

    fn on_complete(&self, _outcome: &ExtractionOutcome) {
        self.completions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_failed(&self, _error: &ExtractError) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }
}

fn config_with(backend: Arc<Scripted>) -> ExtractionConfig {
    ExtractionConfig::builder()
        .backend(backend)
        .fetch_timeout_secs(5)
        .build()
        .expect("valid config")
}

/// Serve one HTTP response on a random local port.
///
/// Returns the URL to fetch and a handle yielding the raw request text.
async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 16 * 1024];
        let n = socket.read(&mut buf).await.unwrap();
        let request = String::from_utf8_lossy(&buf[..n]).into_owned();

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (format!("http://{addr}/lamp-x"), handle)
}

// ── Request validation ───────────────────────────────────────────────────────

#[tokio::test]
async fn empty_request_is_rejected_without_any_call() {
    let backend = Scripted::new(Reply::Text(LAMP_X));
    let recorder = Arc::new(StageRecorder::default());
    let config = ExtractionConfig::builder()
        .backend(backend.clone())
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    let err = extract(ExtractionRequest::new("sk-test"), &config)
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::InvalidRequest));
    assert_eq!(err.stage(), FailureStage::Request);
    assert_eq!(backend.calls(), 0);
    assert_eq!(*recorder.stages.lock().unwrap(), vec![PipelineStage::Idle]);
    assert_eq!(recorder.failures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn blank_credential_is_rejected_without_any_call() {
    let backend = Scripted::new(Reply::Text(LAMP_X));
    let request = ExtractionRequest::new("   ").url("https://shop.example/lamp-x");

    let err = extract(request, &config_with(backend.clone()))
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::MissingCredential));
    assert_eq!(err.stage(), FailureStage::Request);
    assert_eq!(backend.calls(), 0);
}

// ── Web page → structured record ─────────────────────────────────────────────

#[tokio::test]
async fn product_page_is_structured() {
    let html = r#"<html><head><title>Shop</title><meta name="x" content="y"></head>
        <body><script>hidden</script><style>.p{}</style><h1>Lamp X</h1><p>visible</p></body></html>"#;
    let (url, server) = serve_once("200 OK", html.to_string()).await;
    let backend = Scripted::new(Reply::Text(LAMP_X));
    let recorder = Arc::new(StageRecorder::default());
    let config = ExtractionConfig::builder()
        .backend(backend.clone())
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    let output = extract(ExtractionRequest::new("sk-live").url(&url), &config)
        .await
        .expect("extraction should succeed");

    match &output.outcome {
        ExtractionOutcome::Structured(v) => assert_eq!(v["product_name"], "Lamp X"),
        other => panic!("expected structured outcome, got {other:?}"),
    }
    assert_eq!(output.outcome.product().unwrap().product_name, "Lamp X");

    let sent = backend.user_text();
    assert_eq!(sent, "Lamp X visible");
    assert_eq!(backend.calls(), 1);
    assert_eq!(backend.credential.lock().unwrap().as_deref(), Some("sk-live"));

    let request = server.await.unwrap().to_lowercase();
    assert!(request.starts_with("get /lamp-x"), "got: {request}");
    assert!(request.contains("user-agent: mozilla/5.0"), "got: {request}");

    assert_eq!(output.stats.documents, 0);
    assert_eq!(output.stats.web_chars, "Lamp X visible".len());
    assert_eq!(output.stats.prompt_tokens, 120);
    assert!(!output.stats.fallback);

    assert_eq!(
        *recorder.stages.lock().unwrap(),
        vec![
            PipelineStage::Idle,
            PipelineStage::Extracting,
            PipelineStage::Aggregating,
            PipelineStage::Structuring,
            PipelineStage::Validating,
            PipelineStage::Done,
        ]
    );
    assert_eq!(recorder.completions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn long_page_is_truncated_before_the_model() {
    let body = format!("<body><p>{}</p></body>", "lamp ".repeat(5_000));
    let (url, _server) = serve_once("200 OK", body).await;
    let backend = Scripted::new(Reply::Text("{}"));
    let config = ExtractionConfig::builder()
        .backend(backend.clone())
        .web_text_limit(500)
        .build()
        .unwrap();

    let output = extract(ExtractionRequest::new("k").url(url), &config)
        .await
        .unwrap();

    assert_eq!(backend.user_text().chars().count(), 500);
    assert_eq!(output.stats.web_chars, 500);
}

// ── Fallback vs. failure ─────────────────────────────────────────────────────

#[tokio::test]
async fn non_json_answer_becomes_fallback() {
    let (url, _server) = serve_once("200 OK", "<p>Lamp X</p>".into()).await;
    let backend = Scripted::new(Reply::Text("Sorry, I cannot process this."));

    let output = extract(ExtractionRequest::new("k").url(url), &config_with(backend))
        .await
        .expect("fallback is not an error");

    match &output.outcome {
        ExtractionOutcome::Fallback(f) => {
            assert_eq!(f.raw_output, "Sorry, I cannot process this.");
            assert!(!f.warning.is_empty());
        }
        other => panic!("expected fallback, got {other:?}"),
    }
    assert!(output.stats.fallback);

    let json = serde_json::to_value(&output.outcome).unwrap();
    assert_eq!(json["raw_output"], "Sorry, I cannot process this.");
}

#[tokio::test]
async fn model_failure_is_a_structuring_error() {
    let (url, _server) = serve_once("200 OK", "<p>Lamp X</p>".into()).await;
    let backend = Scripted::new(Reply::AuthFailure);

    let err = extract(ExtractionRequest::new("bad-key").url(url), &config_with(backend.clone()))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), FailureStage::Structuring);
    assert!(matches!(err, ExtractError::AuthError { .. }));
    assert_eq!(backend.calls(), 1);
}

// ── Extraction failures ──────────────────────────────────────────────────────

#[tokio::test]
async fn error_page_is_an_extraction_failure() {
    let (url, _server) = serve_once("404 Not Found", "<p>Page not found</p>".into()).await;
    let backend = Scripted::new(Reply::Text(LAMP_X));

    let err = extract(ExtractionRequest::new("k").url(&url), &config_with(backend.clone()))
        .await
        .unwrap_err();

    match &err {
        ExtractError::HttpStatus { url: failed, status } => {
            assert_eq!(failed, &url);
            assert_eq!(*status, 404);
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
    assert_eq!(err.stage(), FailureStage::Extraction);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn bad_document_fails_fast_and_is_named() {
    let backend = Scripted::new(Reply::Text(LAMP_X));
    let request = ExtractionRequest::new("k")
        .document(DocumentInput::new("brochure.pdf", b"<html>not a pdf</html>".to_vec()));

    let err = extract(request, &config_with(backend.clone()))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), FailureStage::Extraction);
    assert_eq!(err.target().as_deref(), Some("brochure.pdf"));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn bad_document_aborts_even_with_a_good_url() {
    let (url, _server) = serve_once("200 OK", "<p>Lamp X</p>".into()).await;
    let backend = Scripted::new(Reply::Text(LAMP_X));
    let request = ExtractionRequest::new("k")
        .document(DocumentInput::new("empty.pdf", Vec::new()))
        .url(url);

    let err = extract(request, &config_with(backend.clone()))
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::NotAPdf { .. }));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn zero_concurrency_still_extracts_documents() {
    let backend = Scripted::new(Reply::Text(LAMP_X));
    let config = ExtractionConfig {
        concurrency: 0,
        backend: Some(backend.clone()),
        ..Default::default()
    };
    let request = ExtractionRequest::new("k").document(DocumentInput::new("a.pdf", b"xx".to_vec()));

    let result = tokio::time::timeout(Duration::from_secs(3), extract(request, &config))
        .await
        .expect("extraction must not stall");

    assert!(matches!(result, Err(ExtractError::NotAPdf { .. })));
    assert_eq!(backend.calls(), 0);
}

// ── pdfium-backed tests (need a pdfium library) ──────────────────────────────

/// Build a minimal PDF with one Helvetica text line per page.
fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let n = pages.len();
    let font_id = 3 + 2 * n;
    let mut objects: Vec<String> = Vec::new();

    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids: Vec<String> = (0..n).map(|i| format!("{} 0 R", 3 + 2 * i)).collect();
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        n
    ));
    for (i, text) in pages.iter().enumerate() {
        let content_id = 4 + 2 * i;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 300 200] /Contents {content_id} 0 R \
             /Resources << /Font << /F1 {font_id} 0 R >> >> >>"
        ));
        let stream = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 12 Tf 20 100 Td ({text}) Tj ET")
        };
        objects.push(format!(
            "<< /Length {} >>\nstream\n{stream}\nendstream",
            stream.len()
        ));
    }
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{body}\nendobj\n", i + 1));
    }
    let xref_at = out.len();
    out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for off in offsets {
        out.push_str(&format!("{off:010} 00000 n \n"));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    ));
    out.into_bytes()
}

macro_rules! pdfium_skip_unless_ready {
    () => {
        if std::env::var("PDFIUM_TESTS").is_err() {
            println!("SKIP — set PDFIUM_TESTS=1 (and PDFIUM_LIB_PATH) to run pdfium tests");
            return;
        }
    };
}

#[tokio::test]
async fn documents_are_aggregated_in_request_order() {
    pdfium_skip_unless_ready!();
    let backend = Scripted::new(Reply::Text(LAMP_X));
    let request = ExtractionRequest::new("k")
        .document(DocumentInput::new("a.pdf", pdf_with_pages(&["Alpha one", "Alpha two"])))
        .document(DocumentInput::new("b.pdf", pdf_with_pages(&["Beta"])));

    let output = extract(request, &config_with(backend.clone())).await.unwrap();

    assert_eq!(backend.user_text(), "Alpha one\nAlpha two\nBeta\n");
    assert_eq!(output.stats.documents, 2);
}

#[tokio::test]
async fn blank_page_keeps_its_separator() {
    pdfium_skip_unless_ready!();
    let text = edgequake_product2json::pipeline::document::extract_document(DocumentInput::new(
        "gap.pdf",
        pdf_with_pages(&["Front", "", "Back"]),
    ))
    .await
    .unwrap();

    assert_eq!(text, "Front\n\nBack");
}
