use super::*;
use axum::{
    http::{HeaderValue, StatusCode},
    routing::post,
    Router,
};
use slack_router_core::{
    signature::{compute_signature, SignatureVerifier, SigningSecret},
    Verification,
};
use tower::ServiceExt;

const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
const BODY: &str = r#"{"type":"event_callback","event":{"type":"message","text":"hi"}}"#;

async fn echo(body: Bytes) -> Bytes {
    body
}

fn app(verification: Verification, verbose: bool, limit: usize) -> Router {
    Router::new().route(
        "/",
        post(echo).route_layer(axum::middleware::from_fn_with_state(
            SigningState::new(verification, verbose, limit),
            verify_slack_signature,
        )),
    )
}

fn signed_app() -> Router {
    app(
        Verification::Signed(SignatureVerifier::new(SigningSecret::from(SECRET))),
        false,
        1024,
    )
}

fn now() -> String {
    chrono::Utc::now().timestamp().to_string()
}

fn request(timestamp: Option<&str>, signature: Option<&str>, body: &str) -> Request {
    let mut builder = axum::http::Request::builder().method("POST").uri("/");
    if let Some(timestamp) = timestamp {
        builder = builder.header(HEADER_TIMESTAMP, timestamp);
    }
    if let Some(signature) = signature {
        builder = builder.header(HEADER_SIGNATURE, signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn signed_request(timestamp: &str, body: &str) -> Request {
    let signature = compute_signature(SECRET.as_bytes(), timestamp, body.as_bytes()).unwrap();
    request(Some(timestamp), Some(&signature), body)
}

async fn body_of(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_valid_signature_passes_body_through_unchanged() {
    let response = signed_app()
        .oneshot(signed_request(&now(), BODY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_of(response).await, BODY.as_bytes());
}

#[tokio::test]
async fn test_skipped_verification_accepts_unsigned_requests() {
    let app = app(Verification::Skipped, false, 1024);

    let response = app.oneshot(request(None, None, BODY)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_of(response).await, BODY.as_bytes());
}

#[tokio::test]
async fn test_missing_headers_are_bad_request() {
    let timestamp = now();
    let signature = compute_signature(SECRET.as_bytes(), &timestamp, BODY.as_bytes()).unwrap();

    for request in [
        request(None, None, BODY),
        request(Some(&timestamp), None, BODY),
        request(None, Some(&signature), BODY),
    ] {
        let response = signed_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_malformed_timestamp_is_bad_request() {
    let response = signed_app()
        .oneshot(request(Some("yesterday"), Some("v0=00"), BODY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_text_timestamp_header_is_bad_request() {
    let mut request = signed_request(&now(), BODY);
    request.headers_mut().insert(
        HEADER_TIMESTAMP,
        HeaderValue::from_bytes(b"\xff\xfe").unwrap(),
    );

    let response = signed_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_hour_old_timestamp_is_unauthorized() {
    let timestamp = (chrono::Utc::now().timestamp() - 3601).to_string();

    let response = signed_app()
        .oneshot(signed_request(&timestamp, BODY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_body_is_unauthorized() {
    let timestamp = now();
    let signature = compute_signature(SECRET.as_bytes(), &timestamp, BODY.as_bytes()).unwrap();
    let tampered = BODY.replace("hi", "ho");

    let response = signed_app()
        .oneshot(request(Some(&timestamp), Some(&signature), &tampered))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_secret_is_unauthorized() {
    let timestamp = now();
    let signature = compute_signature(b"some-other-secret", &timestamp, BODY.as_bytes()).unwrap();

    let response = signed_app()
        .oneshot(request(Some(&timestamp), Some(&signature), BODY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unversioned_signature_is_unauthorized() {
    let response = signed_app()
        .oneshot(request(Some(&now()), Some("WRONG_HEADER"), BODY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let app = app(
        Verification::Signed(SignatureVerifier::new(SigningSecret::from(SECRET))),
        false,
        16,
    );

    let response = app.oneshot(signed_request(&now(), BODY)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_verbose_rejection_explains_without_leaking() {
    let app = app(
        Verification::Signed(SignatureVerifier::new(SigningSecret::from(SECRET))),
        true,
        1024,
    );

    let response = app
        .oneshot(request(Some(&now()), Some("v0=deadbeef"), BODY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = String::from_utf8(body_of(response).await.to_vec()).unwrap();
    assert_eq!(body, "request signature does not match");
    assert!(!body.contains(SECRET));
    assert!(!body.contains("deadbeef"));
}
