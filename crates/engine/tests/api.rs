use std::collections::HashMap;

use axum::Router;
use axum::body::Body;
use courier_engine::api::build_app;
use courier_engine::config::Settings;
use courier_engine::state::AppState;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{header as header_is, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "integration-test-secret";

fn app_with(base_url: &str, api_key: &str) -> Router {
    let env: HashMap<&str, String> = HashMap::from([
        ("OPENAI_BASE_URL", base_url.to_string()),
        ("OPENAI_API_KEY", api_key.to_string()),
        ("JWT_SECRET", SECRET.to_string()),
        ("CHAT_POLL_INTERVAL_MS", "1".to_string()),
        ("CHAT_POLL_MAX_ATTEMPTS", "3".to_string()),
    ]);
    let settings = Settings::from_lookup(|name| env.get(name).cloned()).unwrap();
    let state = AppState::from_settings(&settings).unwrap();
    build_app(state, &settings.allowed_origins)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>, http::HeaderMap) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, body, headers)
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body, _) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn login(app: &Router) -> String {
    let (status, body) = send_json(
        app,
        post_json("/api/admin/login", json!({ "password": "password" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn mount_completed_run(server: &MockServer, thread_id: &str, reply: &str) {
    mount_completed_run_with(
        server,
        thread_id,
        json!([
            {
                "id": "msg_reply",
                "role": "assistant",
                "content": [{ "type": "text", "text": { "value": reply, "annotations": [] } }]
            },
            {
                "id": "msg_user",
                "role": "user",
                "content": [{ "type": "text", "text": { "value": "Hi", "annotations": [] } }]
            }
        ]),
    )
    .await;
}

async fn mount_completed_run_with(server: &MockServer, thread_id: &str, messages: Value) {
    Mock::given(method("POST"))
        .and(path(format!("/threads/{thread_id}/messages")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "msg_user" })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/threads/{thread_id}/runs")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "run_1", "status": "queued" })),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/threads/{thread_id}/runs/run_1")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "run_1", "status": "completed" })),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/threads/{thread_id}/messages")))
        .and(query_param("order", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": messages })))
        .mount(server)
        .await;
}

fn post_raw(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app_with("http://127.0.0.1:9", "sk-test");
    let (status, body) = send_json(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn widget_script_is_uncached_javascript() {
    let app = app_with("http://127.0.0.1:9", "sk-test");
    let request = Request::get("/widget.js?assistant=asst_42&title=Sales&position=bottom-left")
        .header(header::HOST, "chat.example.com")
        .header("x-forwarded-proto", "https")
        .body(Body::empty())
        .unwrap();

    let (status, body, headers) = send(&app, request).await;
    let script = String::from_utf8(body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/javascript");
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache, no-store, must-revalidate");
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::EXPIRES], "0");
    assert!(script.contains(r#""apiEndpoint":"https://chat.example.com/api""#));
    assert!(script.contains(r#""assistantId":"asst_42""#));
    assert!(script.contains(r#""title":"Sales""#));
    assert!(script.contains(r#""position":"bottom-left""#));
}

#[tokio::test]
async fn admin_config_requires_a_valid_token() {
    let app = app_with("http://127.0.0.1:9", "sk-test");

    let (status, body) = send_json(&app, get("/api/admin/config")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Access token required");

    let request = Request::get("/api/admin/config")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = app_with("http://127.0.0.1:9", "sk-test");
    let (status, body) = send_json(
        &app,
        post_json("/api/admin/login", json!({ "password": "letmein" }), None),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid password");
}

#[tokio::test]
async fn admin_can_update_configuration() {
    let app = app_with("http://127.0.0.1:9", "sk-original");
    let token = login(&app).await;

    let request = Request::get("/api/admin/config")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["apiKey"], "***HIDDEN***");
    assert_eq!(body["hasApiKey"], true);

    let (status, body) = send_json(
        &app,
        post_json(
            "/api/admin/config",
            json!({
                "apiKey": "***HIDDEN***",
                "welcomeMessage": "Ask us anything",
                "widgetConfig": { "title": "Help desk", "position": "bottom-left" }
            }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Configuration saved successfully");

    let (status, body) = send_json(&app, get("/api/widget/config")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["welcomeMessage"], "Ask us anything");
    assert_eq!(body["widgetConfig"]["title"], "Help desk");
    assert_eq!(body["widgetConfig"]["position"], "bottom-left");
    assert_eq!(body["widgetConfig"]["primaryColor"], "#3B82F6");
    assert!(body.get("apiKey").is_none());
}

#[tokio::test]
async fn chat_round_trip_returns_reply_and_thread() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threads"))
        .and(header_is("authorization", "Bearer sk-test"))
        .and(header_is("openai-beta", "assistants=v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "thread_new" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_completed_run(&server, "thread_new", "Hello from the assistant").await;

    let app = app_with(&server.uri(), "sk-test");
    let (status, body) = send_json(
        &app,
        post_json("/api/chat", json!({ "message": "Hi", "assistantId": "asst_1" }), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Hello from the assistant");
    assert_eq!(body["threadId"], "thread_new");
}

#[tokio::test]
async fn stale_thread_is_replaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_gone"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "error": { "message": "No thread found with id 'thread_gone'." } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "thread_fresh" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_completed_run(&server, "thread_fresh", "Back again").await;

    let app = app_with(&server.uri(), "sk-test");
    let (status, body) = send_json(
        &app,
        post_json(
            "/api/chat",
            json!({ "message": "Hi", "threadId": "thread_gone", "assistantId": "asst_1" }),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["threadId"], "thread_fresh");
    assert_eq!(body["message"], "Back again");
}

#[tokio::test]
async fn chat_without_assistant_id_is_a_client_error() {
    let server = MockServer::start().await;
    let app = app_with(&server.uri(), "sk-test");

    let (status, body) = send_json(&app, post_json("/api/chat", json!({ "message": "Hi" }), None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Assistant ID is required.");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn chat_without_api_key_is_a_client_error() {
    let server = MockServer::start().await;
    let app = app_with(&server.uri(), "");

    let (status, body) = send_json(
        &app,
        post_json("/api/chat", json!({ "message": "Hi", "assistantId": "asst_1" }), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "OpenAI API key not configured. Please contact the administrator."
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_assistant_is_reported_as_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "thread_1" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "msg_user" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_1/runs"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({ "error": { "message": "No assistant found with id 'asst_nope'." } })),
        )
        .mount(&server)
        .await;

    let app = app_with(&server.uri(), "sk-test");
    let (status, body) = send_json(
        &app,
        post_json("/api/chat", json!({ "message": "Hi", "assistantId": "asst_nope" }), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid Assistant ID. Please check your configuration.");
}

#[tokio::test]
async fn failed_run_hides_service_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "thread_1" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "msg_user" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_1/runs"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "run_1", "status": "queued" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/runs/run_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "run_1",
            "status": "failed",
            "last_error": { "code": "rate_limit_exceeded", "message": "quota exhausted for org-123" }
        })))
        .mount(&server)
        .await;

    let app = app_with(&server.uri(), "sk-test");
    let (status, body) = send_json(
        &app,
        post_json("/api/chat", json!({ "message": "Hi", "assistantId": "asst_1" }), None),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Assistant failed to process the message");
    assert!(!body.to_string().contains("org-123"));
}

#[tokio::test]
async fn run_that_never_settles_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "thread_1" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "msg_user" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/threads/thread_1/runs"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "run_1", "status": "queued" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/threads/thread_1/runs/run_1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "run_1", "status": "in_progress" })),
        )
        .expect(4)
        .mount(&server)
        .await;

    let app = app_with(&server.uri(), "sk-test");
    let (status, body) = send_json(
        &app,
        post_json("/api/chat", json!({ "message": "Hi", "assistantId": "asst_1" }), None),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Request timed out. Please try again.");
}

#[tokio::test]
async fn cors_preflight_mirrors_the_origin() {
    let app = app_with("http://127.0.0.1:9", "sk-test");
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/chat")
        .header(header::ORIGIN, "https://shop.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();

    let (status, _, headers) = send(&app, request).await;

    assert!(status.is_success());
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://shop.example");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn missing_key_is_reported_whatever_the_body() {
    let server = MockServer::start().await;
    let app = app_with(&server.uri(), "");
    let key_error = "OpenAI API key not configured. Please contact the administrator.";

    let (status, body) =
        send_json(&app, post_json("/api/chat", json!({ "assistantId": "asst_1" }), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], key_error);

    let (status, body) = send_json(&app, post_json("/api/chat", json!({}), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], key_error);

    let (status, body) = send_json(&app, post_raw("/api/chat", "not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], key_error);

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn null_assistant_id_is_a_missing_assistant_id() {
    let server = MockServer::start().await;
    let app = app_with(&server.uri(), "sk-test");

    let (status, body) = send_json(
        &app,
        post_json("/api/chat", json!({ "message": "Hi", "assistantId": null }), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Assistant ID is required.");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_message_is_rejected_after_assistant_check() {
    let server = MockServer::start().await;
    let app = app_with(&server.uri(), "sk-test");

    let (status, body) =
        send_json(&app, post_json("/api/chat", json!({ "assistantId": "asst_1" }), None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message is required.");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_chat_body_gets_a_json_error() {
    let server = MockServer::start().await;
    let app = app_with(&server.uri(), "sk-test");

    let (status, raw, headers) = send(&app, post_raw("/api/chat", "not json")).await;
    let body: Value = serde_json::from_slice(&raw).unwrap();

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(body["error"], "Invalid request body.");

    let (status, body) = send_json(
        &app,
        post_json("/api/chat", json!({ "message": 42, "assistantId": "asst_1" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body.");
}

#[tokio::test]
async fn reply_comes_only_from_the_latest_assistant_entry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/threads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "thread_1" })))
        .mount(&server)
        .await;
    mount_completed_run_with(
        &server,
        "thread_1",
        json!([
            {
                "id": "msg_image",
                "role": "assistant",
                "content": [{ "type": "image_file", "image_file": { "file_id": "file_1" } }]
            },
            {
                "id": "msg_user",
                "role": "user",
                "content": [{ "type": "text", "text": { "value": "Hi", "annotations": [] } }]
            },
            {
                "id": "msg_old",
                "role": "assistant",
                "content": [{ "type": "text", "text": { "value": "Answer to an earlier turn", "annotations": [] } }]
            }
        ]),
    )
    .await;

    let app = app_with(&server.uri(), "sk-test");
    let (status, body) = send_json(
        &app,
        post_json("/api/chat", json!({ "message": "Hi", "assistantId": "asst_1" }), None),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to process chat message");
    assert!(!body.to_string().contains("earlier turn"));
}
