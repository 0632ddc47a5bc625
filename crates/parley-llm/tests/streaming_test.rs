use futures::StreamExt;
use parley_llm::{
    stream_completion, ChatRequest, CompletionEvent, GeminiClient, Message, OpenAIClient,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse(frames: &[&str]) -> String {
    frames.iter().map(|f| format!("data: {}\n\n", f)).collect()
}

async fn collect(stream: parley_llm::CompletionStream) -> Vec<CompletionEvent> {
    stream.collect().await
}

#[tokio::test]
async fn test_openai_stream_tokens_and_usage() {
    let server = MockServer::start().await;
    let body = sse(&[
        r#"{"id":"1","choices":[{"index":0,"delta":{"role":"assistant"}}]}"#,
        r#"{"id":"1","choices":[{"index":0,"delta":{"content":"Hello"}}]}"#,
        r#"{"id":"1","choices":[{"index":0,"delta":{"content":" there"},"finish_reason":"stop"}]}"#,
        r#"{"id":"1","choices":[],"usage":{"prompt_tokens":4,"completion_tokens":2,"total_tokens":6}}"#,
        "[DONE]",
    ]);

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({"model": "gpt-4", "stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAIClient::new("sk-test").unwrap().with_base_url(server.uri());
    let request = ChatRequest::new("gpt-4", vec![Message::human("Hi")]);
    let events = collect(stream_completion(&client, request).await.unwrap()).await;

    assert_eq!(
        events,
        vec![
            CompletionEvent::Token { content: "Hello".to_string() },
            CompletionEvent::Token { content: " there".to_string() },
            CompletionEvent::Done { total_tokens: 6 },
        ]
    );
}

#[tokio::test]
async fn test_openai_error_status_fails_before_stream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let client = OpenAIClient::new("bad").unwrap().with_base_url(server.uri());
    let request = ChatRequest::new("gpt-4", vec![Message::human("Hi")]);

    let err = match stream_completion(&client, request).await {
        Ok(_) => panic!("expected failure before streaming"),
        Err(e) => e,
    };
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_openai_malformed_chunk_ends_with_error() {
    let server = MockServer::start().await;
    let body = sse(&[
        r#"{"id":"1","choices":[{"index":0,"delta":{"content":"ok"}}]}"#,
        "{not json",
    ]);
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let client = OpenAIClient::new("k").unwrap().with_base_url(server.uri());
    let events = collect(
        stream_completion(&client, ChatRequest::new("gpt-4", vec![Message::human("Hi")]))
            .await
            .unwrap(),
    )
    .await;

    assert_eq!(events.len(), 2);
    assert!(matches!(events[1], CompletionEvent::Error { .. }));
}

#[tokio::test]
async fn test_gemini_stream_estimates_usage_when_missing() {
    let server = MockServer::start().await;
    let body = sse(&[
        r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Bonjour"}]}}]}"#,
        r#"{"candidates":[{"content":{"role":"model","parts":[{"text":" a tous"}]}}]}"#,
    ]);

    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-pro:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .and(header("x-goog-api-key", "g-test"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": "Answer in French"}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new("g-test").unwrap().with_base_url(server.uri());
    let request = ChatRequest::new(
        "gemini-2.5-pro",
        vec![Message::system("Answer in French"), Message::human("Hello")],
    );
    let events = collect(stream_completion(&client, request).await.unwrap()).await;

    // "Bonjour a tous" is 14 chars -> ceil(14 / 4) = 4
    assert_eq!(events.len(), 3);
    assert_eq!(events[2], CompletionEvent::Done { total_tokens: 4 });
}

#[tokio::test]
async fn test_empty_history_is_rejected() {
    let client = OpenAIClient::new("k").unwrap().with_base_url("http://127.0.0.1:9");
    let result = stream_completion(&client, ChatRequest::new("gpt-4", Vec::new())).await;
    assert!(result.is_err());
}
