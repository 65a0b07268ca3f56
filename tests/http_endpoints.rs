//! Endpoint contract tests, driven through the router without a socket.

use std::sync::Arc;

use axum::http::{header, StatusCode};
use serde_json::json;

mod common;

use common::{alice, alice_example, ProbeDirectory, ISSUER};

fn directory() -> Arc<ProbeDirectory> {
    Arc::new(ProbeDirectory::new(vec![alice(), alice_example()]))
}

#[tokio::test]
async fn tls_check_hostname_skips_lookup() {
    let dir = directory();
    let router = common::router(dir.clone(), None).await;

    let (status, _, body) = common::get(&router, "/tls-check?domain=pds.example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    assert_eq!(dir.lookups(), 0);
}

#[tokio::test]
async fn tls_check_served_handle() {
    let dir = directory();
    let router = common::router(dir.clone(), None).await;

    let (status, _, body) = common::get(&router, "/tls-check?domain=alice.bsky.social").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    assert_eq!(dir.lookups(), 1);
}

#[tokio::test]
async fn tls_check_rejections() {
    let dir = directory();
    let router = common::router(dir.clone(), None).await;

    let (status, _, body) = common::get(&router, "/tls-check").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "InvalidRequest", "message": "bad or missing domain query param"})
    );

    let (status, _, body) = common::get(&router, "/tls-check?domain=a.bsky.social&domain=b.bsky.social").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidRequest");

    let (status, _, body) = common::get(&router, "/tls-check?domain=evil.example.org").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "InvalidRequest", "message": "handles are not provided on this domain"})
    );

    let (status, _, body) = common::get(&router, "/tls-check?domain=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "bad or missing domain query param");

    assert_eq!(dir.lookups(), 0, "rejected requests must not reach the directory");

    let (status, _, body) = common::get(&router, "/tls-check?domain=bob.bsky.social").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"error": "NotFound", "message": "handle not found for this domain"})
    );
}

#[tokio::test]
async fn tls_check_hides_directory_failure() {
    let router = common::router(Arc::new(ProbeDirectory::failing()), None).await;

    let (status, _, body) = common::get(&router, "/tls-check?domain=alice.bsky.social").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": "InternalServerError", "message": "Internal Server Error"})
    );
    assert!(!body.to_string().contains("password"));
}

#[tokio::test]
async fn check_handle_returns_account() {
    let router = common::router(directory(), None).await;

    let (status, _, body) = common::get(&router, "/check-handle?domain=alice.bsky.social").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"did": "did:plc:abc123", "handle": "alice.bsky.social"})
    );
}

#[tokio::test]
async fn check_handle_rejections() {
    let dir = directory();
    let router = common::router(dir.clone(), None).await;

    for uri in ["/check-handle", "/check-handle?domain="] {
        let (status, _, body) = common::get(&router, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["message"], "bad or missing domain query param");
    }

    let (status, _, body) = common::get(&router, "/check-handle?domain=alice.example").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "handles are not provided on this domain");
    assert_eq!(dir.lookups(), 0);

    let (status, _, body) = common::get(&router, "/check-handle?domain=nobody.bsky.social").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");

    let router = common::router(Arc::new(ProbeDirectory::failing()), None).await;
    let (status, _, body) = common::get(&router, "/check-handle?domain=alice.bsky.social").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal Server Error");
}

#[tokio::test]
async fn webfinger_returns_jrd() {
    let router = common::router(directory(), Some(ISSUER)).await;

    let (status, headers, body) = common::get(
        &router,
        "/.well-known/webfinger?resource=acct:alice.example@pds.example.com",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/jrd+json");
    assert_eq!(
        body,
        json!({
            "subject": "acct:alice.example@pds.example.com",
            "links": [{
                "rel": "http://openid.net/specs/connect/1.0/issuer",
                "href": "https://issuer.example",
            }],
        })
    );
}

#[tokio::test]
async fn webfinger_subject_is_decoded_resource() {
    let router = common::router(directory(), Some(ISSUER)).await;

    let (status, _, body) = common::get(
        &router,
        "/.well-known/webfinger?resource=acct%3Aalice.example%40pds.example.com",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject"], "acct:alice.example@pds.example.com");
}

#[tokio::test]
async fn webfinger_malformed_never_looks_up() {
    let dir = directory();
    let router = common::router(dir.clone(), Some(ISSUER)).await;

    for uri in ["/.well-known/webfinger", "/.well-known/webfinger?resource="] {
        let (status, _, body) = common::get(&router, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body, json!({"error": "missing resource parameter"}));
    }

    for resource in ["alice.example", "acct:", "https%3A%2F%2Falice.example", "acct%3A%40host"] {
        let (status, _, body) =
            common::get(&router, &format!("/.well-known/webfinger?resource={}", resource)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "resource {:?}", resource);
        assert_eq!(
            body,
            json!({"error": "invalid resource format, expected acct: URI"})
        );
    }

    assert_eq!(dir.lookups(), 0);
}

#[tokio::test]
async fn webfinger_unknown_account() {
    let router = common::router(directory(), Some(ISSUER)).await;

    let (status, _, body) =
        common::get(&router, "/.well-known/webfinger?resource=acct:bob.example").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "account not found"}));
}

#[tokio::test]
async fn webfinger_disabled_without_issuer() {
    let dir = directory();
    let router = common::router(dir.clone(), None).await;

    let (status, _, body) =
        common::get(&router, "/.well-known/webfinger?resource=acct:alice.example").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "webfinger not configured"}));
    assert_eq!(dir.lookups(), 0);
}

#[tokio::test]
async fn webfinger_hides_directory_failure() {
    let router = common::router(Arc::new(ProbeDirectory::failing()), Some(ISSUER)).await;

    let (status, _, body) =
        common::get(&router, "/.well-known/webfinger?resource=acct:alice.example").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "internal server error"}));
}

#[tokio::test]
async fn responses_carry_request_id() {
    let router = common::router(directory(), None).await;

    let (_, headers, _) = common::get(&router, "/tls-check?domain=pds.example.com").await;
    let id = headers.get("x-request-id").expect("request id header");
    assert!(uuid_like(id.to_str().unwrap()));
}

#[tokio::test]
async fn health_reflects_lifecycle() {
    let router = common::router(directory(), None).await;

    let (status, _, body) = common::get(&router, "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "starting");
}

fn uuid_like(s: &str) -> bool {
    s.len() == 36 && s.chars().filter(|c| *c == '-').count() == 4
}
