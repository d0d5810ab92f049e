//! Integration tests for the HTTP reply client and dispatcher.
//!
//! Each test starts an in-process axum endpoint on an ephemeral port that
//! mimics the dashboard backend's `/chat` route.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use counselor_chat::{
    ChatError, ConversationController, ControllerOptions, Credential, DispatchOutcome,
    HttpReplyClient, RemoteDispatcher, ReplyClient, ReplyRequest, ResponseCatalog,
    StaticCredential,
};
use counselor_core::{Category, Language};

// =============================================================================
// Helpers
// =============================================================================

const TEST_TOKEN: &str = "test-token-12345";

/// Mock `/chat` handler. The message text selects the behaviour.
async fn chat(headers: HeaderMap, Json(request): Json<ReplyRequest>) -> Response {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TEST_TOKEN))
        .unwrap_or(false);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"msg": "Missing token"}))).into_response();
    }

    match request.message.as_str() {
        "crash" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "boom"})),
        )
            .into_response(),
        "garbage" => (StatusCode::OK, "<html>not json</html>").into_response(),
        "blank" => Json(json!({"response": "   "})).into_response(),
        "stall" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"response": "too late"})).into_response()
        }
        _ if request.message.contains("stressed") => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "model offline"})),
        )
            .into_response(),
        message => Json(json!({
            "response": format!("[{}] {}", request.language, message),
            "language": request.language,
            "timestamp": "2024-01-01T00:00:00",
            "ai_powered": true
        }))
        .into_response(),
    }
}

/// Start the mock endpoint and return its URL.
async fn spawn_endpoint() -> String {
    let app = Router::new().route("/chat", post(chat));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/chat", addr)
}

fn token() -> Credential {
    Credential::new(TEST_TOKEN).unwrap()
}

fn http_dispatcher(url: &str, token: Option<&str>, timeout: Duration) -> RemoteDispatcher {
    let client = HttpReplyClient::new(url, timeout).unwrap();
    let credentials = match token {
        Some(t) => StaticCredential::new(t),
        None => StaticCredential::none(),
    };
    RemoteDispatcher::new(Arc::new(client), Arc::new(credentials), timeout)
}

// =============================================================================
// HttpReplyClient
// =============================================================================

#[tokio::test]
async fn test_client_posts_message_and_language() {
    let url = spawn_endpoint().await;
    let client = HttpReplyClient::new(&url, Duration::from_secs(2)).unwrap();
    let reply = client
        .request_reply("नमस्ते", Language::Hi, &token())
        .await
        .unwrap();
    assert_eq!(reply, "[hi] नमस्ते");
}

#[tokio::test]
async fn test_client_wrong_token_is_server_error() {
    let url = spawn_endpoint().await;
    let client = HttpReplyClient::new(&url, Duration::from_secs(2)).unwrap();
    let err = client
        .request_reply("hello", Language::En, &Credential::new("expired").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::ServerError { status: 401 }));
}

#[tokio::test]
async fn test_client_non_success_status() {
    let url = spawn_endpoint().await;
    let client = HttpReplyClient::new(&url, Duration::from_secs(2)).unwrap();
    let err = client
        .request_reply("crash", Language::En, &token())
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::ServerError { status: 500 }));
}

#[tokio::test]
async fn test_client_malformed_body() {
    let url = spawn_endpoint().await;
    let client = HttpReplyClient::new(&url, Duration::from_secs(2)).unwrap();
    let err = client
        .request_reply("garbage", Language::En, &token())
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::MalformedReply(_)));
}

#[tokio::test]
async fn test_client_connection_refused() {
    // Grab a free port, then close it again.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client =
        HttpReplyClient::new(format!("http://{}/chat", addr), Duration::from_secs(2)).unwrap();
    let err = client
        .request_reply("hello", Language::En, &token())
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::TransportFailure(_)), "got {:?}", err);
}

// =============================================================================
// RemoteDispatcher over HTTP
// =============================================================================

#[tokio::test]
async fn test_dispatch_success_over_http() {
    let url = spawn_endpoint().await;
    let outcome = http_dispatcher(&url, Some(TEST_TOKEN), Duration::from_secs(2))
        .dispatch("plan my week", Language::En)
        .await;
    match outcome {
        DispatchOutcome::Reply(text) => assert_eq!(text, "[en] plan my week"),
        other => panic!("expected reply, got {:?}", other),
    }
}

#[tokio::test]
async fn test_dispatch_blank_reply_falls_back() {
    let url = spawn_endpoint().await;
    let outcome = http_dispatcher(&url, Some(TEST_TOKEN), Duration::from_secs(2))
        .dispatch("blank", Language::En)
        .await;
    assert!(matches!(outcome, DispatchOutcome::Fallback(ChatError::EmptyReply)));
}

#[tokio::test]
async fn test_dispatch_stalled_endpoint_times_out() {
    let url = spawn_endpoint().await;
    let started = std::time::Instant::now();
    let outcome = http_dispatcher(&url, Some(TEST_TOKEN), Duration::from_millis(200))
        .dispatch("stall", Language::En)
        .await;
    assert!(
        matches!(outcome, DispatchOutcome::Fallback(ChatError::Timeout(_))),
        "got {:?}",
        outcome
    );
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_dispatch_without_credential_sends_nothing() {
    let url = spawn_endpoint().await;
    let outcome = http_dispatcher(&url, None, Duration::from_secs(2))
        .dispatch("hello", Language::En)
        .await;
    assert!(matches!(
        outcome,
        DispatchOutcome::Fallback(ChatError::CredentialMissing)
    ));
}

// =============================================================================
// Controller over HTTP
// =============================================================================

#[tokio::test]
async fn test_failed_dispatch_with_credential_uses_mental_health_reply() {
    let url = spawn_endpoint().await;
    let options = ControllerOptions {
        language: Language::En,
        greeting: false,
        auto_speak: false,
    };
    let mut controller = ConversationController::open(
        options,
        http_dispatcher(&url, Some(TEST_TOKEN), Duration::from_secs(2)),
    );

    controller.submit("I'm stressed about exams").unwrap();
    let reply = controller.settle().await.unwrap();

    assert_eq!(
        reply.text,
        ResponseCatalog::lookup(Language::En, Category::MentalHealth)
    );
    assert_eq!(controller.messages().len(), 2);
}

#[tokio::test]
async fn test_remote_reply_is_used_verbatim() {
    let url = spawn_endpoint().await;
    let mut controller = ConversationController::open(
        ControllerOptions::default(),
        http_dispatcher(&url, Some(TEST_TOKEN), Duration::from_secs(2)),
    );
    controller.set_language(Language::Hi);
    controller.submit("मदद").unwrap();
    let reply = controller.settle().await.unwrap();
    assert_eq!(reply.text, "[hi] मदद");
    assert_eq!(reply.language, Language::Hi);
    // Greeting + user + assistant.
    assert_eq!(controller.messages().len(), 3);
}
