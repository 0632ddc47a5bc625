use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use parley_client::{ApiClient, ChatSession, ClientError, SendOutcome, SessionState};
use parley_types::{encode_frame, ChatEvent, NewMessage, NewSession, Session};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session(title: &str) -> Session {
    NewSession {
        user_id: "u1".to_string(),
        title: title.to_string(),
        provider: "openai".to_string(),
        model: "gpt-4".to_string(),
    }
    .into_session(Utc::now())
}

fn stream_body(session_id: &str, reply: &str, terminal: ChatEvent) -> Vec<u8> {
    let user = NewMessage::user(session_id, "Hi", "openai", "gpt-4").into_message(Utc::now());
    let mut events = vec![ChatEvent::message(user), ChatEvent::token(reply)];
    if terminal == ChatEvent::Done {
        let assistant =
            NewMessage::assistant(session_id, reply, "openai", "gpt-4", 3).into_message(Utc::now());
        events.push(ChatEvent::message(assistant));
    }
    events.push(terminal);
    events
        .iter()
        .map(|e| encode_frame(e).unwrap())
        .collect::<String>()
        .into_bytes()
}

async fn mount_session(server: &MockServer, session: &Session) {
    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(session))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_first_send_creates_titled_session_and_streams() {
    let server = MockServer::start().await;
    let created = session("Hi");
    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .and(body_partial_json(json!({"title": "Hi", "provider": "openai", "model": "gpt-4"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(&created))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/api/sessions/{}/messages", created.id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(stream_body(&created.id, "Hello!", ChatEvent::Done), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let chat = ChatSession::new(ApiClient::new(server.uri()).unwrap(), "openai", "gpt-4");
    let outcome = chat.send("Hi").await.unwrap();

    assert_eq!(outcome, SendOutcome::Completed);
    assert_eq!(chat.state(), SessionState::Idle);
    assert_eq!(chat.session_id(), Some(created.id.clone()));
    let conversation = chat.conversation();
    assert_eq!(conversation.messages().len(), 2);
    assert_eq!(conversation.messages()[1].content, "Hello!");
    assert_eq!(conversation.draft(), "");
}

#[tokio::test]
async fn test_error_event_surfaces_as_stream_error() {
    let server = MockServer::start().await;
    let created = session("Hi");
    mount_session(&server, &created).await;
    Mock::given(method("POST"))
        .and(path(format!("/api/sessions/{}/messages", created.id)))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            stream_body(&created.id, "part", ChatEvent::error("quota exceeded")),
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let chat = ChatSession::new(ApiClient::new(server.uri()).unwrap(), "openai", "gpt-4");
    let err = chat.send("Hi").await.unwrap_err();

    assert!(matches!(err, ClientError::Stream(ref msg) if msg == "quota exceeded"));
    assert_eq!(chat.state(), SessionState::Idle);
    // The echoed user message stays applied
    assert_eq!(chat.conversation().messages().len(), 1);
}

#[tokio::test]
async fn test_rejection_before_stream_is_api_error() {
    let server = MockServer::start().await;
    let created = session("Hi");
    mount_session(&server, &created).await;
    Mock::given(method("POST"))
        .and(path(format!("/api/sessions/{}/messages", created.id)))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "Provider openai not available"})),
        )
        .mount(&server)
        .await;

    let chat = ChatSession::new(ApiClient::new(server.uri()).unwrap(), "openai", "gpt-4");
    let err = chat.send("Hi").await.unwrap_err();

    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Provider openai not available");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_json_reply_is_not_a_stream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sessions/s1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri()).unwrap();
    let err = api
        .send_message("s1", "Hi", "openai", "gpt-4")
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ClientError::NotStreaming(_)));
}

#[tokio::test]
async fn test_send_while_streaming_is_ignored() {
    let server = MockServer::start().await;
    let created = session("Hi");
    mount_session(&server, &created).await;
    Mock::given(method("POST"))
        .and(path(format!("/api/sessions/{}/messages", created.id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(stream_body(&created.id, "Hello!", ChatEvent::Done), "text/event-stream")
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let chat = Arc::new(ChatSession::new(
        ApiClient::new(server.uri()).unwrap(),
        "openai",
        "gpt-4",
    ));
    let first = tokio::spawn({
        let chat = Arc::clone(&chat);
        async move { chat.send("Hi").await }
    });

    while chat.state() == SessionState::Idle {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(chat.send("Again").await.unwrap(), SendOutcome::Ignored);
    assert_eq!(first.await.unwrap().unwrap(), SendOutcome::Completed);
}

#[tokio::test]
async fn test_cancel_returns_to_idle_without_terminal_event() {
    let server = MockServer::start().await;
    let created = session("Hi");
    mount_session(&server, &created).await;
    Mock::given(method("POST"))
        .and(path(format!("/api/sessions/{}/messages", created.id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(stream_body(&created.id, "late", ChatEvent::Done), "text/event-stream")
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let chat = Arc::new(ChatSession::new(
        ApiClient::new(server.uri()).unwrap(),
        "openai",
        "gpt-4",
    ));
    let pending = tokio::spawn({
        let chat = Arc::clone(&chat);
        async move { chat.send("Hi").await }
    });

    while chat.state() == SessionState::Idle {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    chat.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(2), pending)
        .await
        .expect("cancel should not wait for the stream")
        .unwrap()
        .unwrap();
    assert_eq!(outcome, SendOutcome::Cancelled);
    assert_eq!(chat.state(), SessionState::Idle);
    assert!(chat.conversation().messages().is_empty());
}

#[tokio::test]
async fn test_cancel_during_session_creation_keeps_session_id() {
    let server = MockServer::start().await;
    let created = session("Hi");
    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(&created)
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/api/sessions/{}/messages", created.id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(stream_body(&created.id, "late", ChatEvent::Done), "text/event-stream"),
        )
        .expect(0)
        .mount(&server)
        .await;

    let chat = Arc::new(ChatSession::new(
        ApiClient::new(server.uri()).unwrap(),
        "openai",
        "gpt-4",
    ));
    let pending = tokio::spawn({
        let chat = Arc::clone(&chat);
        async move { chat.send("Hi").await }
    });

    while chat.state() == SessionState::Idle {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    chat.cancel();

    let outcome = pending.await.unwrap().unwrap();
    assert_eq!(outcome, SendOutcome::Cancelled);
    assert_eq!(chat.state(), SessionState::Idle);
    assert_eq!(chat.session_id(), Some(created.id.clone()));
}

#[tokio::test]
async fn test_open_loads_existing_messages() {
    let server = MockServer::start().await;
    let existing = session("Old chat");
    let message = NewMessage::user(&existing.id, "Earlier", "openai", "gpt-4").into_message(Utc::now());
    let mut body = serde_json::to_value(&existing).unwrap();
    body["messages"] = json!([message]);
    Mock::given(method("GET"))
        .and(path(format!("/api/sessions/{}", existing.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let chat = ChatSession::new(ApiClient::new(server.uri()).unwrap(), "gemini", "gemini-2.5-flash");
    chat.open(&existing.id).await.unwrap();

    assert_eq!(chat.session_id(), Some(existing.id));
    assert_eq!(chat.conversation().messages().len(), 1);
    assert_eq!(chat.conversation().messages()[0].content, "Earlier");
}

#[tokio::test]
async fn test_raw_event_stream_decodes_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sessions/s1/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(stream_body("s1", "Hello!", ChatEvent::Done), "text/event-stream"),
        )
        .mount(&server)
        .await;

    let api = ApiClient::new(format!("{}/", server.uri())).unwrap();
    let events: Vec<ChatEvent> = api
        .send_message("s1", "Hi", "openai", "gpt-4")
        .await
        .unwrap()
        .map(|e| e.unwrap())
        .collect()
        .await;

    let kinds: Vec<&str> = events.iter().map(ChatEvent::kind).collect();
    assert_eq!(kinds, vec!["message", "token", "message", "done"]);
}

#[tokio::test]
async fn test_delete_unknown_session() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/sessions/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Session not found"})))
        .mount(&server)
        .await;

    let api = ApiClient::new(server.uri()).unwrap();
    let err = api.delete_session("missing").await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 404, .. }));
}
