// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Request extractor that decodes a body according to its declared content type

use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::{codec::Payload, content_type::ContentType, error::PayloadError};

/// Body decoded with the decoder selected by the request's `Content-Type` header
///
/// Rejects the request with [`PayloadError`] when the header is missing, names an
/// unsupported media type, or the body does not decode.
#[derive(Debug)]
pub struct Negotiated<T> {
    /// Content type the body was decoded with
    pub content_type: ContentType,
    /// Decoded value
    pub value: T,
}

impl<T, S> FromRequest<S> for Negotiated<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = PayloadError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let content_type =
            ContentType::from_headers(req.headers()).ok_or(PayloadError::MissingContentType)?;
        let value = Payload::new().read_request(&content_type, req).await?;
        Ok(Self {
            content_type,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request as HttpRequest, header},
    };
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Greeting {
        message: String,
    }

    fn request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = HttpRequest::builder().method("POST").uri("/greetings");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder
            .body(Body::from(body))
            .expect("request should build")
    }

    #[tokio::test]
    async fn decodes_using_declared_type() -> Result<(), PayloadError> {
        let req = request(Some("application/x-yaml"), "message: hello\n");
        let Negotiated {
            content_type,
            value,
        } = Negotiated::<Greeting>::from_request(req, &()).await?;

        assert_eq!(content_type, ContentType::Yaml);
        assert_eq!(value.message, "hello");
        Ok(())
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let req = request(None, r#"{"message":"hello"}"#);
        let result = Negotiated::<Greeting>::from_request(req, &()).await;
        assert!(matches!(result, Err(PayloadError::MissingContentType)));
    }

    #[tokio::test]
    async fn unsupported_header_is_rejected() {
        let req = request(Some("text/csv"), "message\nhello\n");
        let result = Negotiated::<Greeting>::from_request(req, &()).await;
        assert!(matches!(
            result,
            Err(PayloadError::UnsupportedContentType { .. })
        ));
    }
}
