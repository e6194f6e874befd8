//! End-to-end relay tests against a mock backend.

use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};

mod common;

use common::{client, dead_backend_url, relay_config, start_relay, MockBackend, Reply};

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-bytes";

async fn detail_of(response: reqwest::Response) -> String {
    let body: Value = response.json().await.unwrap();
    body["detail"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn notes_relays_image_and_forwards_auth() {
    let backend = MockBackend::start(Reply::image("image/png", PNG)).await;
    let relay = start_relay(relay_config(&backend.url())).await;

    let res = client()
        .post(relay.url("/api/visual-notes"))
        .header("authorization", "Bearer user-token-123")
        .json(&json!({ "text": "  Photosynthesis converts light into energy.  " }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(res.headers()["cache-control"], "no-store");
    assert_eq!(
        res.headers()["content-disposition"],
        "inline; filename=\"visual-notes.png\""
    );
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.bytes().await.unwrap().as_ref(), PNG);

    let seen = backend.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].path, "/api/visual-notes");
    assert_eq!(seen[0].header("authorization"), Some("Bearer user-token-123"));
    assert!(seen[0].header("x-request-id").is_some());

    let forwarded: Value = serde_json::from_slice(&seen[0].body).unwrap();
    assert_eq!(
        forwarded,
        json!({ "text": "  Photosynthesis converts light into energy.  " })
    );
}

#[tokio::test]
async fn notes_accepts_text_at_the_limit() {
    let backend = MockBackend::start(Reply::image("image/png", PNG)).await;
    let relay = start_relay(relay_config(&backend.url())).await;

    let res = client()
        .post(relay.url("/api/visual-notes"))
        .header("authorization", "Bearer t")
        .json(&json!({ "text": "a".repeat(5000) }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn notes_rejects_text_over_the_limit() {
    let backend = MockBackend::start(Reply::image("image/png", PNG)).await;
    let relay = start_relay(relay_config(&backend.url())).await;

    let res = client()
        .post(relay.url("/api/visual-notes"))
        .header("authorization", "Bearer t")
        .json(&json!({ "text": "a".repeat(5001) }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 413);
    assert_eq!(detail_of(res).await, "Text must be less than 5000 characters");
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn notes_rejects_missing_text_without_calling_backend() {
    let backend = MockBackend::start(Reply::image("image/png", PNG)).await;
    let relay = start_relay(relay_config(&backend.url())).await;

    for body in [json!({ "text": "" }), json!({ "text": "   " }), json!({})] {
        let res = client()
            .post(relay.url("/api/visual-notes"))
            .header("authorization", "Bearer t")
            .json(&body)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 400, "body: {body}");
        assert_eq!(detail_of(res).await, "Text is required");
    }

    let res = client()
        .post(relay.url("/api/visual-notes"))
        .header("authorization", "Bearer t")
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn notes_requires_credentials_by_default() {
    let backend = MockBackend::start(Reply::image("image/png", PNG)).await;
    let relay = start_relay(relay_config(&backend.url())).await;

    let res = client()
        .post(relay.url("/api/visual-notes"))
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 401);
    assert_eq!(detail_of(res).await, "Authentication required");
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn notes_relays_anonymously_when_auth_is_optional() {
    let backend = MockBackend::start(Reply::image("image/png", PNG)).await;
    let mut config = relay_config(&backend.url());
    config.relay.require_auth = false;
    let relay = start_relay(config).await;

    let res = client()
        .post(relay.url("/api/visual-notes"))
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let seen = backend.requests();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].header("authorization").is_none());
}

#[tokio::test]
async fn backend_detail_and_status_pass_through() {
    let backend = MockBackend::start(Reply::json(
        402,
        json!({ "detail": "Insufficient credits" }),
    ))
    .await;
    let relay = start_relay(relay_config(&backend.url())).await;

    let res = client()
        .post(relay.url("/api/visual-notes"))
        .header("authorization", "Bearer t")
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 402);
    assert_eq!(detail_of(res).await, "Insufficient credits");
}

#[tokio::test]
async fn backend_plain_text_error_becomes_detail() {
    let backend = MockBackend::start(Reply::new(500, "oops")).await;
    let relay = start_relay(relay_config(&backend.url())).await;

    let res = client()
        .post(relay.url("/api/visual-notes"))
        .header("authorization", "Bearer t")
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    assert_eq!(detail_of(res).await, "oops");
}

#[tokio::test]
async fn backend_disposition_is_preserved() {
    let reply = Reply::image("image/webp", PNG)
        .with_header("content-disposition", "attachment; filename=\"notes.webp\"");
    let backend = MockBackend::start(reply).await;
    let relay = start_relay(relay_config(&backend.url())).await;

    let res = client()
        .post(relay.url("/api/visual-notes"))
        .header("authorization", "Bearer t")
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "image/webp");
    assert_eq!(
        res.headers()["content-disposition"],
        "attachment; filename=\"notes.webp\""
    );
}

#[tokio::test]
async fn unreachable_backend_yields_route_message() {
    let relay = start_relay(relay_config(&dead_backend_url().await)).await;

    let res = client()
        .post(relay.url("/api/visual-notes"))
        .header("authorization", "Bearer t")
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    assert_eq!(detail_of(res).await, "Failed to generate visual notes");

    let form = Form::new()
        .part("file", Part::bytes(PNG.to_vec()).file_name("page.png"))
        .text("target_lang", "fr");
    let res = client()
        .post(relay.url("/api/visual-translation"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    assert_eq!(detail_of(res).await, "Failed to translate image");
}

#[tokio::test]
async fn translation_relays_multipart() {
    let backend = MockBackend::start(Reply::image("image/png", b"translated")).await;
    let relay = start_relay(relay_config(&backend.url())).await;

    let file = Part::bytes(PNG.to_vec())
        .file_name("worksheet.png")
        .mime_str("image/png")
        .unwrap();
    let form = Form::new().part("file", file).text("target_lang", "es");

    let res = client()
        .post(relay.url("/api/visual-translation"))
        .header("authorization", "Bearer user-token")
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(
        res.headers()["content-disposition"],
        "inline; filename=\"translated-image.png\""
    );
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"translated");

    let seen = backend.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].path, "/api/visual-translation");
    assert_eq!(seen[0].header("authorization"), Some("Bearer user-token"));
    assert!(seen[0]
        .header("content-type")
        .unwrap()
        .starts_with("multipart/form-data; boundary="));

    let body = seen[0].body_text();
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"worksheet.png\""));
    assert!(body.contains("fake-image-bytes"));
    assert!(body.contains("name=\"target_lang\""));
    assert!(body.contains("es"));
}

#[tokio::test]
async fn translation_defaults_content_type_when_backend_omits_it() {
    let backend = MockBackend::start(Reply::new(200, b"raw-image".to_vec())).await;
    let relay = start_relay(relay_config(&backend.url())).await;

    let form = Form::new()
        .part("file", Part::bytes(PNG.to_vec()).file_name("page.png"))
        .text("target_lang", "de");
    let res = client()
        .post(relay.url("/api/visual-translation"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(res.headers()["cache-control"], "no-store");
}

#[tokio::test]
async fn translation_requires_file_and_language() {
    let backend = MockBackend::start(Reply::image("image/png", PNG)).await;
    let relay = start_relay(relay_config(&backend.url())).await;

    let only_lang = Form::new().text("target_lang", "fr");
    let res = client()
        .post(relay.url("/api/visual-translation"))
        .multipart(only_lang)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    assert_eq!(detail_of(res).await, "File and target_lang are required");

    let only_file = Form::new().part("file", Part::bytes(PNG.to_vec()).file_name("page.png"));
    let res = client()
        .post(relay.url("/api/visual-translation"))
        .multipart(only_file)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    assert_eq!(detail_of(res).await, "File and target_lang are required");

    let res = client()
        .post(relay.url("/api/visual-translation"))
        .json(&json!({ "target_lang": "fr" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn translation_error_field_passes_through() {
    let backend = MockBackend::start(Reply::json(
        422,
        json!({ "error": "Unsupported language" }),
    ))
    .await;
    let relay = start_relay(relay_config(&backend.url())).await;

    let form = Form::new()
        .part("file", Part::bytes(PNG.to_vec()).file_name("page.png"))
        .text("target_lang", "xx");
    let res = client()
        .post(relay.url("/api/visual-translation"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 422);
    assert_eq!(detail_of(res).await, "Unsupported language");
}

#[tokio::test]
async fn client_request_id_reaches_backend() {
    let backend = MockBackend::start(Reply::image("image/png", PNG)).await;
    let relay = start_relay(relay_config(&backend.url())).await;

    let res = client()
        .post(relay.url("/api/visual-notes"))
        .header("authorization", "Bearer t")
        .header("x-request-id", "trace-abc")
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.headers()["x-request-id"], "trace-abc");
    assert_eq!(backend.requests()[0].header("x-request-id"), Some("trace-abc"));
}

#[tokio::test]
async fn empty_backend_error_uses_route_message() {
    let backend = MockBackend::start(Reply::new(502, Vec::new())).await;
    let relay = start_relay(relay_config(&backend.url())).await;

    let form = Form::new()
        .part("file", Part::bytes(PNG.to_vec()).file_name("page.png"))
        .text("target_lang", "fr");
    let res = client()
        .post(relay.url("/api/visual-translation"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
    assert_eq!(detail_of(res).await, "Failed to translate image");

    let res = client()
        .post(relay.url("/api/visual-notes"))
        .header("authorization", "Bearer t")
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
    assert_eq!(detail_of(res).await, "Failed to generate visual notes");
}

#[tokio::test]
async fn backend_detail_is_relayed_verbatim() {
    let backend = MockBackend::start(Reply::json(400, json!({ "detail": "  X  " }))).await;
    let relay = start_relay(relay_config(&backend.url())).await;

    let res = client()
        .post(relay.url("/api/visual-notes"))
        .header("authorization", "Bearer t")
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    assert_eq!(detail_of(res).await, "  X  ");
}
