use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use zapiszto::sync::auth::{AuthError, AuthGate, Credentials, Session, SignUpOutcome, User};
use zapiszto::sync::supabase::{RemoteError, RemoteStore, SupabaseClient};

fn setup(server: &MockServer) -> SupabaseClient {
    SupabaseClient::new(&server.uri(), "anon", Duration::from_secs(5)).unwrap()
}

fn session() -> Session {
    Session {
        access_token: "at-1".into(),
        refresh_token: Some("rt-1".into()),
        expires_at: None,
        user: User { id: "user-1".into(), email: Some("ola@example.com".into()) },
    }
}

fn session_response() -> serde_json::Value {
    json!({
        "access_token": "at-new",
        "token_type": "bearer",
        "expires_in": 3600,
        "expires_at": 1900000000,
        "refresh_token": "rt-new",
        "user": { "id": "user-1", "email": "ola@example.com", "aud": "authenticated" }
    })
}

// --- Tables ---

#[tokio::test]
async fn insert_sends_auth_headers_and_returns_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/notes"))
        .and(header("apikey", "anon"))
        .and(header("authorization", "Bearer at-1"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!([{ "title": "a" }, { "title": "b" }])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            { "id": "r1", "title": "a" },
            { "id": "r2", "title": "b" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = setup(&server);
    let rows = [json!({ "title": "a" }), json!({ "title": "b" })];
    let stored = client.insert(&session(), "notes", &rows).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1]["id"], "r2");
}

#[tokio::test]
async fn insert_error_carries_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/tasks"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "23502",
            "message": "null value in column \"title\""
        })))
        .mount(&server)
        .await;

    let client = setup(&server);
    let err = client.insert(&session(), "tasks", &[json!({})]).await.unwrap_err();
    match err {
        RemoteError::Api { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("null value"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn delete_filters_by_id_list() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/habits"))
        .and(query_param("id", "in.(h1,h2)"))
        .and(header("authorization", "Bearer at-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = setup(&server);
    client
        .delete(&session(), "habits", &["h1".to_string(), "h2".to_string()])
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_nothing_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let client = setup(&server);
    client.delete(&session(), "habits", &[]).await.unwrap();
}

// --- Auth ---

#[tokio::test]
async fn sign_in_success_sets_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", "anon"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_response()))
        .mount(&server)
        .await;

    let gate = AuthGate::new(setup(&server));
    let session = gate
        .sign_in(&Credentials::new("ola@example.com", "secret1"))
        .await
        .unwrap();
    assert_eq!(session.access_token, "at-new");
    assert_eq!(session.expires_at, Some(1900000000));
    assert!(gate.is_authenticated());
    assert_eq!(gate.current_user().unwrap().id, "user-1");
}

#[tokio::test]
async fn sign_in_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let gate = AuthGate::new(setup(&server));
    let err = gate
        .sign_in(&Credentials::new("ola@example.com", "wrong"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Rejected(ref m) if m == "Invalid login credentials"));
    assert!(!gate.is_authenticated());
}

#[tokio::test]
async fn sign_up_waiting_for_confirmation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-2",
            "email": "new@example.com",
            "confirmation_sent_at": "2026-10-19T08:00:00Z"
        })))
        .mount(&server)
        .await;

    let gate = AuthGate::new(setup(&server));
    let outcome = gate
        .sign_up(&Credentials::new("new@example.com", "secret1"), "secret1")
        .await
        .unwrap();
    match outcome {
        SignUpOutcome::ConfirmationRequired(user) => assert_eq!(user.id, "user-2"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!gate.is_authenticated());
}

#[tokio::test]
async fn sign_up_validates_before_calling_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_response()))
        .expect(0)
        .mount(&server)
        .await;

    let gate = AuthGate::new(setup(&server));
    let mismatch = gate.sign_up(&Credentials::new("a@example.com", "secret1"), "secret2").await;
    assert!(matches!(mismatch, Err(AuthError::PasswordMismatch)));
    let short = gate.sign_up(&Credentials::new("a@example.com", "abc"), "abc").await;
    assert!(matches!(short, Err(AuthError::PasswordTooShort)));
}

#[tokio::test]
async fn sign_out_clears_session_even_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gate = AuthGate::new(setup(&server));
    gate.restore(session());
    assert!(gate.sign_out().await.is_err());
    assert!(!gate.is_authenticated());
}
