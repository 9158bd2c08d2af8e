use armin_core::session::Citation;
use armin_interaction::wire::{GenerateContentRequest, Part};
use armin_interaction::{BackendRequest, GeminiApiClient, GenerativeBackend};
use futures::StreamExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-3-flash-preview";
const KEY: &str = "test-key-123";

fn request(model: &str) -> BackendRequest {
    BackendRequest::new(
        model,
        KEY,
        GenerateContentRequest::single_turn(vec![Part::text("hello")]),
    )
}

fn client(server: &MockServer) -> GeminiApiClient {
    GeminiApiClient::new().with_base_url(format!("{}/v1beta/models", server.uri()))
}

#[tokio::test]
async fn test_stream_chat_yields_chunks_in_order() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"A\"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"B\"}]}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"C\"}]},",
        "\"groundingMetadata\":{\"groundingChunks\":[{\"web\":{\"uri\":\"https://u1\",\"title\":\"t1\"}}]}}]}\n\n",
    );

    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{MODEL}:streamGenerateContent")))
        .and(query_param("alt", "sse"))
        .and(query_param("key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let stream = client(&server).stream_chat(request(MODEL)).await.unwrap();
    let chunks: Vec<_> = stream.collect().await;
    assert_eq!(chunks.len(), 3);

    let text: String = chunks
        .iter()
        .filter_map(|c| c.as_ref().unwrap().text.clone())
        .collect();
    assert_eq!(text, "ABC");

    let last = chunks.last().unwrap().as_ref().unwrap();
    assert_eq!(last.citations, vec![Citation::new("t1", "https://u1")]);
}

#[tokio::test]
async fn test_stream_chat_maps_quota_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{MODEL}:streamGenerateContent")))
        .respond_with(ResponseTemplate::new(429).set_body_string(
            r#"{"error":{"code":429,"message":"Quota exceeded for quota metric","status":"RESOURCE_EXHAUSTED"}}"#,
        ))
        .mount(&server)
        .await;

    let err = match client(&server).stream_chat(request(MODEL)).await {
        Ok(_) => panic!("expected an error"),
        Err(err) => err,
    };
    assert!(err.is_quota_exceeded());
    assert!(err.user_message().contains("Quota Exceeded"));
}

#[tokio::test]
async fn test_generate_returns_inline_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash-image:generateContent"))
        .and(query_param("key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"iVBORw=="}}]}}]}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let reply = client(&server)
        .generate(request("gemini-2.5-flash-image"))
        .await
        .unwrap();
    assert!(reply.text.is_empty());
    assert_eq!(reply.images.len(), 1);
    assert_eq!(reply.images[0].data_uri(), "data:image/png;base64,iVBORw==");
}

#[tokio::test]
async fn test_generate_rejected_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#,
        ))
        .mount(&server)
        .await;

    let err = client(&server).generate(request(MODEL)).await.unwrap_err();
    assert!(err.is_invalid_credential());
}

#[tokio::test]
async fn test_connection_error_does_not_leak_key() {
    let client = GeminiApiClient::new().with_base_url("http://127.0.0.1:1/v1beta/models");
    let err = client.generate(request(MODEL)).await.unwrap_err();
    assert!(err.is_transport());
    assert!(!err.to_string().contains(KEY));
}
