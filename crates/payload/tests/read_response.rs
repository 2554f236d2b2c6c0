// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for reading client responses
//!
//! These tests use wiremock to serve bodies in each content type and read them back
//! through a real reqwest response.

use payload::{CONTENT_TYPE_XML, CONTENT_TYPE_YAML, ContentType, Payload, PayloadError};
use serde::{Deserialize, Serialize};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Repository {
    name: String,
    stars: u32,
    archived: bool,
}

fn repository() -> Repository {
    Repository {
        name: "web-service-kit".to_string(),
        stars: 128,
        archived: false,
    }
}

async fn serve(body: impl Into<Vec<u8>>, mime: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repository"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.into(), mime))
        .mount(&server)
        .await;
    server
}

async fn fetch(server: &MockServer) -> reqwest::Response {
    reqwest::get(format!("{}/repository", server.uri()))
        .await
        .expect("mock server should answer")
}

#[tokio::test]
async fn reads_json_response() -> Result<(), PayloadError> {
    let server = serve(
        r#"{"name":"web-service-kit","stars":128,"archived":false}"#,
        "application/json",
    )
    .await;

    let decoded: Repository = Payload::new()
        .read_response(&ContentType::Json, fetch(&server).await)
        .await?;
    assert_eq!(decoded, repository());
    Ok(())
}

#[tokio::test]
async fn reads_xml_and_yaml_responses() -> Result<(), PayloadError> {
    let payload = Payload::new();

    for (content_type, mime) in [
        (ContentType::Xml, CONTENT_TYPE_XML),
        (ContentType::Yaml, CONTENT_TYPE_YAML),
    ] {
        let server = serve(content_type.encode(&repository())?, mime).await;
        let decoded: Repository = payload
            .read_response(&content_type, fetch(&server).await)
            .await?;
        assert_eq!(decoded, repository());
    }
    Ok(())
}

#[tokio::test]
async fn malformed_response_is_a_decode_error() {
    let server = serve("name: [unterminated", "application/x-yaml").await;

    let result = Payload::new()
        .read_response::<Repository>(&ContentType::Yaml, fetch(&server).await)
        .await;

    let err = result.expect_err("malformed YAML must not decode");
    assert!(err.is_decode(), "{err:?}");
}

#[tokio::test]
async fn unknown_content_type_is_rejected() {
    let server = serve("name=web-service-kit", "text/plain").await;

    let result = Payload::new()
        .read_response::<Repository>(&ContentType::parse("text/plain"), fetch(&server).await)
        .await;

    assert!(matches!(
        result,
        Err(PayloadError::UnsupportedContentType { .. })
    ));
}

#[tokio::test]
async fn oversized_response_is_rejected() {
    let server = serve(vec![b'x'; 4096], "application/json").await;

    let result = Payload::new()
        .with_body_limit(1024)
        .read_response::<Repository>(&ContentType::Json, fetch(&server).await)
        .await;

    assert!(matches!(
        result,
        Err(PayloadError::BodyTooLarge { limit: 1024 })
    ));
}
