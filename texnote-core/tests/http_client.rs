//! Integration tests for the HTTP conversion client against a local mock
//! backend.

use std::time::Duration;

use axum::{extract::Json, http::StatusCode, routing::post, Router};
use serde_json::{json, Value};
use texnote_core::{ConvertBackend, ConvertError, HttpConvertClient};
use texnote_types::{ConversionRequest, Format};

/// Serve `router` on an ephemeral port and return its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: &str) -> HttpConvertClient {
    HttpConvertClient::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_convert_latex_round_trip() {
    let router = Router::new().route(
        "/notes/convert/",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["latex_content"], "$x^2$");
            assert_eq!(body["format"], "katex");
            Json(json!({ "html_content": "<span class=\"katex\">x²</span>" }))
        }),
    );
    let base = serve(router).await;

    let html = client(&base)
        .convert_latex(&ConversionRequest::new("$x^2$", Format::Katex))
        .await
        .unwrap();
    assert!(html.contains("katex"));
}

#[tokio::test]
async fn test_convert_latex_sends_plain_html_format() {
    let router = Router::new().route(
        "/notes/convert/",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["format"], "plain_html");
            Json(json!({ "html_content": "<p>x squared</p>" }))
        }),
    );
    let base = serve(router).await;

    let html = client(&base)
        .convert_latex(&ConversionRequest::new("$x^2$", Format::PlainHtml))
        .await
        .unwrap();
    assert_eq!(html, "<p>x squared</p>");
}

#[tokio::test]
async fn test_convert_latex_server_error_is_backend_error() {
    let router = Router::new().route(
        "/notes/convert/",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let base = serve(router).await;

    let err = client(&base)
        .convert_latex(&ConversionRequest::new("$x$", Format::Katex))
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::Backend(_)));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_convert_mathpix_with_stats() {
    let router = Router::new().route(
        "/convert/",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["mathpix_text"], "\\section{A} $x$");
            assert_eq!(body["include_stats"], true);
            Json(json!({
                "success": true,
                "html_fragment": "<h2>A</h2>",
                "stats": {
                    "total_equations": 1,
                    "display_equations": 0,
                    "inline_equations": 1,
                    "sections": 1,
                    "words": 2,
                    "characters": 16
                },
                "conversion_time_ms": 42
            }))
        }),
    );
    let base = serve(router).await;

    let response = client(&base)
        .convert_mathpix("\\section{A} $x$", true)
        .await
        .unwrap();
    assert!(response.success);
    assert_eq!(response.html_fragment, "<h2>A</h2>");
    let stats = response.stats.unwrap();
    assert!(stats.is_consistent());
    assert_eq!(response.conversion_time_ms, Some(42));
}

#[tokio::test]
async fn test_convert_mathpix_backend_reported_failure() {
    let router = Router::new().route(
        "/convert/",
        post(|| async {
            Json(json!({
                "success": false,
                "error": "could not extract equations"
            }))
        }),
    );
    let base = serve(router).await;

    let response = client(&base).convert_mathpix("$x$", false).await.unwrap();
    assert!(!response.success);
    assert_eq!(response.html_fragment, "");
    assert_eq!(
        response.error.as_deref(),
        Some("could not extract equations")
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_http_error() {
    // Nothing listens on this port.
    let client = HttpConvertClient::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
    let err = client
        .convert_latex(&ConversionRequest::new("$x$", Format::Katex))
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::Http(_)));
}
