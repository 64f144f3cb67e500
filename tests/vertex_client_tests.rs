// Vertex AI client and token exchange tests against a mock Google backend
// Author: kelexine (https://github.com/kelexine)

use imgdesc::auth::TokenManager;
use imgdesc::config::{AuthConfig, VertexConfig};
use imgdesc::describe::{describe_image, DescriptionResult, ImageDescriber};
use imgdesc::error::GatewayError;
use imgdesc::models::gemini::InlineData;
use imgdesc::vertex::VertexClient;
use imgdesc::vision::UploadRequest;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Value};
use std::io::Write;
use tempfile::NamedTempFile;

const SERVICE_ACCOUNT: &str = include_str!("fixtures/service_account.json");
const PROJECT: &str = "imgdesc-test";
const GENERATE_PATH: &str = "/v1/projects/imgdesc-test/locations/us-central1/publishers/google/models/gemini-2.0-flash-lite-001:generateContent";
const JWT_GRANT: &str = "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer";
const ACCESS_TOKEN: &str = "ya29.test-access-token";

/// Writes a credentials file whose token endpoint points at the mock server.
fn credentials_file(mut credentials: Value, server: &ServerGuard) -> NamedTempFile {
    credentials["token_uri"] = Value::String(format!("{}/token", server.url()));

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(credentials.to_string().as_bytes()).unwrap();
    file
}

fn service_account_file(server: &ServerGuard) -> NamedTempFile {
    credentials_file(serde_json::from_str(SERVICE_ACCOUNT).unwrap(), server)
}

fn client_for(server: &ServerGuard, credentials: &NamedTempFile) -> VertexClient {
    let auth = AuthConfig {
        credentials_path: Some(credentials.path().to_string_lossy().to_string()),
        ..Default::default()
    };
    let vertex = VertexConfig {
        project_id: Some(PROJECT.to_string()),
        api_base_url: Some(server.url()),
        ..Default::default()
    };

    let tokens = TokenManager::load(&auth).unwrap();
    VertexClient::new(&vertex, tokens).unwrap()
}

fn token_body() -> String {
    json!({
        "access_token": ACCESS_TOKEN,
        "expires_in": 3599,
        "token_type": "Bearer"
    })
    .to_string()
}

fn png_image() -> InlineData {
    InlineData {
        mime_type: "image/png".to_string(),
        data: "aGVsbG8=".to_string(),
    }
}

#[tokio::test]
async fn test_generate_content_sends_prompt_and_image() {
    let mut server = Server::new_async().await;
    let credentials = service_account_file(&server);

    let token_mock = server
        .mock("POST", "/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(JWT_GRANT.to_string()),
            Matcher::Regex("assertion=".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(token_body())
        .expect(1)
        .create_async()
        .await;

    let generate_mock = server
        .mock("POST", GENERATE_PATH)
        .match_header("authorization", format!("Bearer {}", ACCESS_TOKEN).as_str())
        .match_body(Matcher::Json(json!({
            "contents": [{
                "role": "user",
                "parts": [
                    {"text": "describe"},
                    {"inlineData": {"mimeType": "image/png", "data": "aGVsbG8="}}
                ]
            }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "A"}, {"text": "B"}]},
                    "finishReason": "STOP"
                }]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, &credentials);
    let response = client.generate_content("describe", png_image()).await.unwrap();

    assert_eq!(
        DescriptionResult::from_response(&response),
        DescriptionResult::Success {
            text: "AB".to_string()
        }
    );

    token_mock.assert_async().await;
    generate_mock.assert_async().await;
}

#[tokio::test]
async fn test_access_token_is_reused() {
    let mut server = Server::new_async().await;
    let credentials = service_account_file(&server);

    let token_mock = server
        .mock("POST", "/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(token_body())
        .expect(1)
        .create_async()
        .await;

    let generate_mock = server
        .mock("POST", GENERATE_PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"ok"}]}}]}"#)
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server, &credentials);
    client.generate_content("describe", png_image()).await.unwrap();
    client.generate_content("describe", png_image()).await.unwrap();

    token_mock.assert_async().await;
    generate_mock.assert_async().await;
}

#[tokio::test]
async fn test_upstream_error_message_is_propagated() {
    let mut server = Server::new_async().await;
    let credentials = service_account_file(&server);

    server
        .mock("POST", "/token")
        .with_status(200)
        .with_body(token_body())
        .create_async()
        .await;

    server
        .mock("POST", GENERATE_PATH)
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"error":{"code":429,"message":"Quota exceeded for aiplatform","status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .create_async()
        .await;

    let client = client_for(&server, &credentials);
    let err = client
        .generate_content("describe", png_image())
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Generation(_)));
    let message = err.to_string();
    assert!(message.contains("429"));
    assert!(message.contains("Quota exceeded for aiplatform"));
}

#[tokio::test]
async fn test_unparseable_response_is_a_generation_error() {
    let mut server = Server::new_async().await;
    let credentials = service_account_file(&server);

    server
        .mock("POST", "/token")
        .with_status(200)
        .with_body(token_body())
        .create_async()
        .await;

    server
        .mock("POST", GENERATE_PATH)
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let client = client_for(&server, &credentials);
    let err = client
        .generate_content("describe", png_image())
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("Response parsing error"));
}

#[tokio::test]
async fn test_rejected_token_exchange_skips_generation() {
    let mut server = Server::new_async().await;
    let credentials = service_account_file(&server);

    server
        .mock("POST", "/token")
        .with_status(400)
        .with_body(r#"{"error":"invalid_grant","error_description":"Invalid JWT Signature."}"#)
        .create_async()
        .await;

    let generate_mock = server
        .mock("POST", GENERATE_PATH)
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server, &credentials);
    let err = client
        .generate_content("describe", png_image())
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::TokenExchange(_)));
    assert!(err.to_string().contains("invalid_grant"));
    generate_mock.assert_async().await;
}

#[tokio::test]
async fn test_authorized_user_refresh_flow() {
    let mut server = Server::new_async().await;
    let credentials = credentials_file(
        json!({
            "type": "authorized_user",
            "client_id": "imgdesc-client.apps.googleusercontent.com",
            "client_secret": "client-secret",
            "refresh_token": "1//0refresh-token"
        }),
        &server,
    );

    let token_mock = server
        .mock("POST", "/token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            Matcher::UrlEncoded("refresh_token".into(), "1//0refresh-token".into()),
            Matcher::UrlEncoded("client_secret".into(), "client-secret".into()),
        ]))
        .with_status(200)
        .with_body(token_body())
        .expect(1)
        .create_async()
        .await;

    let generate_mock = server
        .mock("POST", GENERATE_PATH)
        .match_header("authorization", format!("Bearer {}", ACCESS_TOKEN).as_str())
        .with_status(200)
        .with_body(r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"ok"}]}}]}"#)
        .create_async()
        .await;

    let client = client_for(&server, &credentials);
    client.generate_content("describe", png_image()).await.unwrap();

    token_mock.assert_async().await;
    generate_mock.assert_async().await;
}

#[tokio::test]
async fn test_describe_image_reports_block_reason() {
    let mut server = Server::new_async().await;
    let credentials = service_account_file(&server);

    server
        .mock("POST", "/token")
        .with_status(200)
        .with_body(token_body())
        .create_async()
        .await;

    server
        .mock("POST", GENERATE_PATH)
        .with_status(200)
        .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
        .create_async()
        .await;

    let client = client_for(&server, &credentials);
    let upload = UploadRequest::new(
        bytes::Bytes::from_static(b"fake image data"),
        Some("image/jpeg"),
        Some("fake_image.jpg".to_string()),
    );

    match describe_image(&client, "describe", &upload).await {
        DescriptionResult::Empty { fallback } => assert!(fallback.contains("SAFETY")),
        other => panic!("expected fallback, got {:?}", other),
    }
}

#[test]
fn test_missing_credentials_file() {
    let auth = AuthConfig {
        credentials_path: Some("/nonexistent/imgdesc/credentials.json".to_string()),
        ..Default::default()
    };

    let err = TokenManager::load(&auth).err().unwrap();
    assert!(matches!(err, GatewayError::Credentials(_)));
}

#[test]
fn test_client_requires_project() {
    let server_url = "http://127.0.0.1:9";
    let mut credentials = NamedTempFile::new().unwrap();
    credentials.write_all(SERVICE_ACCOUNT.as_bytes()).unwrap();

    let auth = AuthConfig {
        credentials_path: Some(credentials.path().to_string_lossy().to_string()),
        ..Default::default()
    };
    let vertex = VertexConfig {
        api_base_url: Some(server_url.to_string()),
        ..Default::default()
    };

    let tokens = TokenManager::load(&auth).unwrap();
    let err = VertexClient::new(&vertex, tokens).err().unwrap();
    assert!(matches!(err, GatewayError::Config(_)));
}
