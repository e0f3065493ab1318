// BackendClient against a local stub of the companion backend

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use voice_companion::backend::{Sender, SettingsUpdate};
use voice_companion::config::BackendConfig;
use voice_companion::history::collect_history;
use voice_companion::{ApiError, BackendApi, BackendClient};

const TOKEN: &str = "token-abc";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some(format!("Bearer {}", TOKEN).as_str())
}

async fn settings(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(json!({
        "language": "hi",
        "cultural_preference": "american",
        "accent": "indian"
    })))
}

async fn patch_settings(
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    // Echo back what was sent, as the real endpoint does
    Ok(Json(body))
}

async fn verify_otp(Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    if body["otp"] != "123456" {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(Json(json!({
        "token": TOKEN,
        "user": { "name": "Asha", "phone_number": body["phone_number"] }
    })))
}

async fn history(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    axum::extract::State(addr): axum::extract::State<SocketAddr>,
) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let page = match params.get("page").map(String::as_str) {
        None | Some("1") => json!({
            "results": [
                { "id": 1, "sender": "bot", "message": "Namaste!" },
                { "id": 2, "sender": "user", "message": "Hello" }
            ],
            "next": format!("http://{}/api/conversations/?page=2", addr)
        }),
        Some("2") => json!({
            "results": [
                { "id": 3, "sender": "bot", "message": "How was your day?",
                  "created_at": "2026-10-01T09:30:00Z" }
            ],
            "next": null
        }),
        _ => return Err(StatusCode::NOT_FOUND),
    };
    Ok(Json(page))
}

async fn start_stub() -> BackendClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new()
        .route("/api/auth/login/", post(|| async { Json(json!({ "message": "OTP sent" })) }))
        .route("/api/auth/verify-otp/", post(verify_otp))
        .route("/api/user/settings/", get(settings).patch(patch_settings))
        .route("/api/conversations/", get(history))
        .route(
            "/api/opening-message/",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "summary job failed") }),
        )
        .route(
            "/api/chat/",
            post(|| async { Json(json!({ "sender": "user", "message": 42 })) }),
        )
        .with_state(addr);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    BackendClient::new(&BackendConfig {
        base_url: format!("http://{}/", addr),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_get_settings_with_bearer_token() {
    let client = start_stub().await;

    let settings = client.get_settings(TOKEN).await.unwrap();

    assert_eq!(settings.language.as_deref(), Some("hi"));
    assert_eq!(settings.cultural_preference.as_deref(), Some("american"));
    assert_eq!(settings.accent.as_deref(), Some("indian"));
}

#[tokio::test]
async fn test_bad_token_is_unauthorized() {
    let client = start_stub().await;

    let err = client.get_settings("expired").await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn test_update_settings_sends_only_set_fields() {
    let client = start_stub().await;

    let settings = client
        .update_settings(
            TOKEN,
            SettingsUpdate {
                accent: Some("british".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(settings.accent.as_deref(), Some("british"));
    assert_eq!(settings.language, None);
    assert_eq!(settings.cultural_preference, None);
}

#[tokio::test]
async fn test_server_error_keeps_status_and_body() {
    let client = start_stub().await;

    let err = client.opening_message(TOKEN).await.unwrap_err();

    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "summary job failed");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let client = start_stub().await;

    let err = client.post_chat_message(TOKEN, "hi").await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_verify_otp_copies_token_into_profile() {
    let client = start_stub().await;

    client.login("+919800000000").await.unwrap();
    let auth = client.verify_otp("+919800000000", "123456").await.unwrap();

    assert_eq!(auth.token, TOKEN);
    assert_eq!(auth.user.name, "Asha");
    assert_eq!(auth.user.token, TOKEN);

    let err = client.verify_otp("+919800000000", "000000").await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 400, .. }));
}

#[tokio::test]
async fn test_history_follows_next_cursor() {
    let client = start_stub().await;

    let messages = collect_history(&client, TOKEN, 10).await.unwrap();

    let texts: Vec<_> = messages.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(texts, ["Namaste!", "Hello", "How was your day?"]);
    assert_eq!(messages[0].sender, Sender::Bot);
    assert!(messages[2].created_at.is_some());
}

#[tokio::test]
async fn test_history_respects_limit() {
    let client = start_stub().await;

    let messages = collect_history(&client, TOKEN, 2).await.unwrap();

    assert_eq!(messages.len(), 2);
}
