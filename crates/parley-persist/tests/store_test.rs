use chrono::{Duration, Utc};
use parley_persist::{ConversationStore, InMemoryStore, PersistError};
use parley_types::{MessageRole, NewMessage, NewSession, NewUser, Session, SessionUpdate};

async fn seeded() -> (InMemoryStore, Session) {
    let store = InMemoryStore::new();
    let user = store.create_user(NewUser::new("demo_user")).await.unwrap();
    let session = store
        .create_session(NewSession {
            user_id: user.id,
            title: "New Chat".to_string(),
            provider: "openai".to_string(),
            model: "gpt-4".to_string(),
        })
        .await
        .unwrap();
    (store, session)
}

#[tokio::test]
async fn test_composite_read_sorts_by_creation_time() {
    let (store, session) = seeded().await;
    let base = Utc::now();

    // Inserted out of order on purpose
    for offset in [3, 1, 2, 0] {
        let message = NewMessage::user(&session.id, format!("m{}", offset), "openai", "gpt-4")
            .into_message(base + Duration::seconds(offset));
        store.insert_message(message).await.unwrap();
    }

    let full = store
        .get_session_with_messages(&session.id)
        .await
        .unwrap()
        .unwrap();
    let contents: Vec<&str> = full.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["m0", "m1", "m2", "m3"]);
    assert!(full
        .messages
        .windows(2)
        .all(|w| w[0].created_at <= w[1].created_at));
}

#[tokio::test]
async fn test_delete_session_cascades_to_messages() {
    let (store, session) = seeded().await;
    let user_msg = store
        .create_message(NewMessage::user(&session.id, "Hi", "openai", "gpt-4"))
        .await
        .unwrap();
    store
        .create_message(NewMessage::assistant(&session.id, "Hello", "openai", "gpt-4", 3))
        .await
        .unwrap();

    store.delete_session(&session.id).await.unwrap();

    assert!(store.get_session_messages(&session.id).await.unwrap().is_empty());
    assert!(store.get_message(&user_msg.id).await.unwrap().is_none());
    assert!(store.get_session(&session.id).await.unwrap().is_none());
    assert!(store
        .list_user_sessions(&session.user_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_delete_unknown_session_is_not_found() {
    let store = InMemoryStore::new();
    let err = store.delete_session("missing").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_message_round_trip_through_composite_read() {
    let (store, session) = seeded().await;
    store
        .create_message(NewMessage::assistant(&session.id, "Answer", "gemini", "gemini-2.5-flash", 42))
        .await
        .unwrap();

    let full = store
        .get_session_with_messages(&session.id)
        .await
        .unwrap()
        .unwrap();
    let stored = &full.messages[0];

    assert_eq!(stored.role, MessageRole::Assistant);
    assert_eq!(stored.content, "Answer");
    assert_eq!(stored.provider, "gemini");
    assert_eq!(stored.model, "gemini-2.5-flash");
    assert_eq!(stored.tokens_used, Some(42));
}

#[tokio::test]
async fn test_user_and_assistant_keep_creation_order() {
    let (store, session) = seeded().await;
    store
        .create_message(NewMessage::user(&session.id, "Q", "openai", "gpt-4"))
        .await
        .unwrap();
    store
        .create_message(NewMessage::assistant(&session.id, "A", "openai", "gpt-4", 1))
        .await
        .unwrap();

    let messages = store.get_session_messages(&session.id).await.unwrap();
    let roles: Vec<MessageRole> = messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![MessageRole::User, MessageRole::Assistant]);
}

#[tokio::test]
async fn test_message_for_unknown_session_rejected() {
    let store = InMemoryStore::new();
    let err = store
        .create_message(NewMessage::user("missing", "Hi", "openai", "gpt-4"))
        .await
        .unwrap_err();
    assert!(matches!(err, PersistError::SessionNotFound(_)));
}

#[tokio::test]
async fn test_messages_of_unknown_session_are_empty() {
    let store = InMemoryStore::new();
    assert!(store.get_session_messages("missing").await.unwrap().is_empty());
    assert!(store.get_session_with_messages("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_message_bumps_session() {
    let (store, session) = seeded().await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    store
        .create_message(NewMessage::user(&session.id, "Hi", "openai", "gpt-4"))
        .await
        .unwrap();

    let bumped = store.get_session(&session.id).await.unwrap().unwrap();
    assert!(bumped.updated_at > session.updated_at);
}

#[tokio::test]
async fn test_update_merges_and_refreshes_timestamp() {
    let (store, session) = seeded().await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let updated = store
        .update_session(&session.id, SessionUpdate::title("Renamed"))
        .await
        .unwrap();

    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.provider, session.provider);
    assert_eq!(updated.model, session.model);
    assert!(updated.updated_at > session.updated_at);

    let noop = store
        .update_session(&session.id, SessionUpdate::default())
        .await
        .unwrap();
    assert!(noop.updated_at >= updated.updated_at);
}

#[tokio::test]
async fn test_update_unknown_session() {
    let store = InMemoryStore::new();
    let err = store
        .update_session("missing", SessionUpdate::title("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, PersistError::SessionNotFound(_)));
}

#[tokio::test]
async fn test_sessions_listed_most_recent_first() {
    let (store, first) = seeded().await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = store
        .create_session(NewSession {
            user_id: first.user_id.clone(),
            title: "Second".to_string(),
            provider: "openai".to_string(),
            model: "gpt-4".to_string(),
        })
        .await
        .unwrap();

    let ids: Vec<String> = store
        .list_user_sessions(&first.user_id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec![second.id.clone(), first.id.clone()]);

    // Activity in the older session moves it to the front
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    store
        .create_message(NewMessage::user(&first.id, "bump", "openai", "gpt-4"))
        .await
        .unwrap();
    let ids: Vec<String> = store
        .list_user_sessions(&first.user_id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let store = InMemoryStore::new();
    store.create_user(NewUser::new("alice")).await.unwrap();
    let err = store.create_user(NewUser::new("alice")).await.unwrap_err();
    assert!(matches!(err, PersistError::DuplicateUsername(_)));
}

#[tokio::test]
async fn test_ensure_user_is_idempotent() {
    let store = InMemoryStore::new();
    let first = store.ensure_user(NewUser::new("demo_user")).await.unwrap();
    let second = store.ensure_user(NewUser::new("demo_user")).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(
        store.get_user(&first.id).await.unwrap().unwrap().username,
        "demo_user"
    );
}

#[tokio::test]
async fn test_concurrent_ensure_user_yields_one_record() {
    let store = std::sync::Arc::new(InMemoryStore::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.ensure_user(NewUser::new("demo_user")).await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn test_validation_failures() {
    let (store, session) = seeded().await;
    let err = store
        .create_message(NewMessage::user(&session.id, "   ", "openai", "gpt-4"))
        .await
        .unwrap_err();
    assert!(matches!(err, PersistError::Validation(_)));

    let err = store
        .update_session(&session.id, SessionUpdate::title("t".repeat(201)))
        .await
        .unwrap_err();
    assert!(matches!(err, PersistError::Validation(_)));
}

#[tokio::test]
async fn test_delete_message() {
    let (store, session) = seeded().await;
    let message = store
        .create_message(NewMessage::user(&session.id, "Hi", "openai", "gpt-4"))
        .await
        .unwrap();

    store.delete_message(&message.id).await.unwrap();
    assert!(store.get_message(&message.id).await.unwrap().is_none());
    assert!(matches!(
        store.delete_message(&message.id).await.unwrap_err(),
        PersistError::MessageNotFound(_)
    ));
}

#[tokio::test]
async fn test_insert_rejects_existing_id() {
    let (store, session) = seeded().await;
    let message = NewMessage::user(&session.id, "Hi", "openai", "gpt-4").into_message(Utc::now());

    store.insert_message(message.clone()).await.unwrap();
    let err = store.insert_message(message.clone()).await.unwrap_err();

    assert!(matches!(err, PersistError::DuplicateMessage(ref id) if *id == message.id));
    assert_eq!(store.get_session_messages(&session.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_insert_validates_record() {
    let (store, session) = seeded().await;
    let blank = NewMessage::user(&session.id, "  ", "openai", "gpt-4").into_message(Utc::now());

    let err = store.insert_message(blank).await.unwrap_err();
    assert!(matches!(err, PersistError::Validation(_)));
    assert!(store.get_session_messages(&session.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_model_is_stored() {
    let (store, session) = seeded().await;
    let message = store
        .create_message(NewMessage::user(&session.id, "Hi", "gemini", ""))
        .await
        .unwrap();
    assert_eq!(message.model, "");
}
