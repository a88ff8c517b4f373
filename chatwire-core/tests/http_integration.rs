//! Integration tests for the reqwest transport against a mock SSE server

use chatwire_core::config::SecretString;
use chatwire_core::http::{ChatTransport, HttpClient, TransportError};
use chatwire_core::protocol::{HostMessage, ResponsePart};
use chatwire_core::providers::openai::{
    to_wire_messages, ChatClient, ChatOptions, ReconstructorConfig, ResponseReconstructor,
};
use chatwire_core::providers::ErrorCode;
use futures::StreamExt;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sse(events: &[serde_json::Value]) -> String {
    let mut body = String::new();
    for event in events {
        body.push_str(&format!("data: {}\n\n", event));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

fn sse_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

fn options(key: &str) -> ChatOptions {
    ChatOptions {
        api_key: Some(SecretString::new(key)),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_streams_and_reconstructs_response() {
    let server = MockServer::start().await;
    let body = sse(&[
        json!({"choices": [{"delta": {"reasoning_details": [{"text": "Let"}]}}]}),
        json!({"choices": [{"delta": {"reasoning_details": [{"text": "Let me think"}]}}]}),
        json!({"choices": [{"delta": {"content": "Hello"}}]}),
        json!({"choices": [{"delta": {"content": " world"}, "finish_reason": "stop"}]}),
    ]);

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header_exists("x-request-id"))
        .and(body_partial_json(json!({
            "model": "MiniMax-M2",
            "stream": true,
            "reasoning_split": true,
            "messages": [{"role": "user", "content": "hi"}]
        })))
        .respond_with(sse_response(body))
        .expect(1)
        .mount(&server)
        .await;

    let http = HttpClient::new(format!("{}/v1", server.uri())).unwrap();
    let client = ChatClient::new(Arc::new(http));
    let mut stream = client
        .stream_chat(
            "MiniMax-M2",
            to_wire_messages(&[HostMessage::user("hi")]),
            options("sk-test"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let mut reconstructor = ResponseReconstructor::new(ReconstructorConfig::default());
    let mut parts = Vec::new();
    while let Some(chunk) = stream.next().await {
        parts.extend(reconstructor.process_chunk(&chunk.unwrap()));
    }

    let thinking: Vec<_> = parts
        .iter()
        .filter_map(|part| match part {
            ResponsePart::Thinking { value, .. } => Some(value.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(thinking, vec!["Let", " me think"]);
    assert_eq!(
        parts[2..],
        [ResponsePart::text("Hello"), ResponsePart::text(" world")]
    );
}

#[tokio::test]
async fn test_unauthorized_is_classified_as_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "invalid api key"}})),
        )
        .mount(&server)
        .await;

    let client = ChatClient::new(Arc::new(HttpClient::new(server.uri()).unwrap()));
    let err = match client
        .stream_chat(
            "MiniMax-M2",
            to_wire_messages(&[HostMessage::user("hi")]),
            options("sk-bad"),
            &CancellationToken::new(),
        )
        .await
    {
        Ok(_) => panic!("expected an authentication failure"),
        Err(e) => e,
    };

    assert_eq!(err.code, ErrorCode::AuthenticationError);
    assert_eq!(err.status_code, Some(401));
    assert!(err.message.contains("invalid api key"));
}

#[tokio::test]
async fn test_server_error_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"base_resp": {"status_code": 1000, "status_msg": "overloaded"}})),
        )
        .mount(&server)
        .await;

    let http = HttpClient::new(server.uri()).unwrap();
    let request = ChatClient::build_request("MiniMax-M2", vec![], &ChatOptions::default());
    let err = match http
        .open_stream(&request, &SecretString::new("sk-test"), CancellationToken::new())
        .await
    {
        Ok(_) => panic!("expected an API error"),
        Err(e) => e,
    };

    match err {
        TransportError::Api { status, message } => {
            assert_eq!(status, 500);
            assert!(message.contains("overloaded"));
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_events_are_skipped() {
    let server = MockServer::start().await;
    let body = format!(
        "data: {{not json\n\n{}",
        sse(&[json!({"choices": [{"delta": {"content": "ok"}}]})])
    );
    Mock::given(method("POST"))
        .respond_with(sse_response(body))
        .mount(&server)
        .await;

    let client = ChatClient::new(Arc::new(HttpClient::new(server.uri()).unwrap()));
    let stream = client
        .stream_chat("MiniMax-M2", vec![], options("sk-test"), &CancellationToken::new())
        .await
        .unwrap();

    let chunks: Vec<_> = stream.collect().await;
    assert_eq!(chunks.len(), 1);
    let chunk = chunks.into_iter().next().unwrap().unwrap();
    assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_cancel_while_waiting_for_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(sse_response(sse(&[])).set_delay(Duration::from_secs(30)))
        .mount(&server)
        .await;

    let client = ChatClient::new(Arc::new(HttpClient::new(server.uri()).unwrap()));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        client.stream_chat("MiniMax-M2", vec![], options("sk-test"), &cancel),
    )
    .await
    .expect("cancellation should abort the pending request");

    match result {
        Ok(_) => panic!("expected the request to be aborted"),
        Err(e) => assert_eq!(e.code, ErrorCode::Timeout),
    }
}
