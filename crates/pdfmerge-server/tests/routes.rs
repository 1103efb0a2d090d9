//! Router tests driven through `tower::ServiceExt::oneshot` with an
//! in-memory source, so no network access is needed.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use edgequake_pdfmerge::{MergeConfig, MergeError, RemoteSource};
use lopdf::{Dictionary, Document, Object, Stream};
use pdfmerge_server::{router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

struct FixtureSource(HashMap<&'static str, Vec<u8>>);

#[async_trait]
impl RemoteSource for FixtureSource {
    async fn probe_content_type(
        &self,
        _url: &str,
        _timeout_secs: u64,
    ) -> Result<Option<String>, MergeError> {
        Ok(None)
    }

    async fn fetch(&self, url: &str, _timeout_secs: u64) -> Result<Vec<u8>, MergeError> {
        self.0.get(url).cloned().ok_or_else(|| MergeError::DownloadFailed {
            url: url.to_string(),
            reason: "HTTP 404 Not Found".into(),
        })
    }
}

fn one_page_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
    let page_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("MediaBox", Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()])),
        ("Contents", Object::Reference(content_id)),
    ]));
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
            ("Count", Object::Integer(1)),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn app() -> Router {
    let source = FixtureSource(HashMap::from([
        ("https://x/a.pdf", one_page_pdf()),
        ("https://x/b.pdf", one_page_pdf()),
        ("https://x/broken.jpg", b"not an image".to_vec()),
    ]));
    let config = MergeConfig::builder()
        .source(Arc::new(source))
        .build()
        .unwrap();
    router(AppState::new(config))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn page_count(pdf: &[u8]) -> usize {
    Document::load_mem(pdf).unwrap().get_pages().len()
}

#[tokio::test]
async fn test_multiple_returns_pdf_attachment() {
    let res = app()
        .oneshot(post_json(
            "/merge-urls/multiple",
            json!({ "urls": ["https://x/a.pdf", "https://x/b.pdf"], "filename": "both.pdf" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        res.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"both.pdf\""
    );
    let declared: usize = res.headers()[header::CONTENT_LENGTH]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body.len(), declared);
    assert_eq!(page_count(&body), 2);
}

#[tokio::test]
async fn test_multiple_rejects_non_pdf_urls() {
    let res = app()
        .oneshot(post_json(
            "/merge-urls/multiple",
            json!({ "urls": ["https://x/a.pdf", "https://x/photo.jpg"] }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(res).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid URLs: https://x/photo.jpg");
}

#[tokio::test]
async fn test_missing_urls_is_empty_input() {
    let res = app()
        .oneshot(post_json("/merge-mixed/all", json!({ "filename": "x.pdf" })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(res).await;
    assert_eq!(body["message"], "No URLs provided");
}

#[tokio::test]
async fn test_two_keeps_order_and_default_filename() {
    let res = app()
        .oneshot(post_json(
            "/merge-urls/two",
            json!({ "url1": "https://x/b.pdf", "url2": "https://x/a.pdf" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"merged.pdf\""
    );
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(page_count(&body), 2);
}

#[tokio::test]
async fn test_mixed_with_broken_image_still_succeeds() {
    let res = app()
        .oneshot(post_json(
            "/merge-mixed/all",
            json!({ "urls": ["https://x/a.pdf", "https://x/broken.jpg"], "type": "mixed" }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(page_count(&body), 2);
}

#[tokio::test]
async fn test_mixed_type_filters_and_unknown_type_is_mixed() {
    let urls = json!(["https://x/a.pdf", "https://x/broken.jpg"]);

    let res = app()
        .oneshot(post_json("/merge-mixed/all", json!({ "urls": urls.clone(), "type": "pdf-only" })))
        .await
        .unwrap();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(page_count(&body), 1);

    let res = app()
        .oneshot(post_json("/merge-mixed/all", json!({ "urls": urls, "type": "whatever" })))
        .await
        .unwrap();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(page_count(&body), 2);
}

#[tokio::test]
async fn test_download_failure_is_500() {
    let res = app()
        .oneshot(post_json(
            "/merge-mixed/all",
            json!({ "urls": ["https://x/a.pdf", "https://x/gone.pdf"] }),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(res).await;
    assert!(body["message"].as_str().unwrap().contains("https://x/gone.pdf"));
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let req = Request::builder()
        .method("POST")
        .uri("/merge-mixed/all")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let res = app().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["success"], false);
}

#[tokio::test]
async fn test_help_and_health() {
    for uri in ["/merge-urls/help", "/merge-mixed/help", "/health"] {
        let res = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{uri}");
    }

    let res = app()
        .oneshot(Request::builder().uri("/merge-mixed/help").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(res).await;
    assert_eq!(body["endpoint"], "POST /merge-mixed/all");
    assert_eq!(body["supportedFormats"]["images"].as_array().unwrap().len(), 8);
}
