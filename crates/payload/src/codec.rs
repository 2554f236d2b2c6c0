// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Payload codec
//!
//! Reads request bodies, writes response bodies and reads client response bodies using
//! the encoder/decoder selected by a [`ContentType`]. The codec keeps no state between
//! calls and can be shared freely across handlers.

use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error, warn};

use crate::{
    content_type::ContentType,
    error::{PayloadError, PayloadResult},
};

/// Default maximum body size accepted by the read paths (2 MiB)
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

const PLAIN_TEXT: HeaderValue = HeaderValue::from_static("text/plain; charset=utf-8");

/// Content-type aware reader and writer for HTTP payloads
#[derive(Debug, Clone, Copy)]
pub struct Payload {
    body_limit: usize,
}

impl Default for Payload {
    fn default() -> Self {
        Self::new()
    }
}

impl Payload {
    /// Create a codec with the default body limit
    pub const fn new() -> Self {
        Self {
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Use a different maximum body size for the read paths
    #[must_use]
    pub const fn with_body_limit(mut self, body_limit: usize) -> Self {
        self.body_limit = body_limit;
        self
    }

    /// Maximum body size accepted by the read paths
    pub const fn body_limit(&self) -> usize {
        self.body_limit
    }

    /// Read the whole request body and decode it as `content_type`
    ///
    /// The request is consumed, so its body is drained and released whatever the outcome.
    /// The body is read before the content type is checked.
    ///
    /// # Errors
    ///
    /// - [`PayloadError::RequestBody`] if the body cannot be read or exceeds the limit
    /// - [`PayloadError::Decode`] if the bytes are not valid for `content_type`
    /// - [`PayloadError::UnsupportedContentType`] for an unknown content type
    pub async fn read_request<T: DeserializeOwned>(
        &self,
        content_type: &ContentType,
        request: Request,
    ) -> PayloadResult<T> {
        let bytes = to_bytes(request.into_body(), self.body_limit)
            .await
            .map_err(|source| {
                error!(error = %source, "failed to read payload posted in request");
                PayloadError::RequestBody { source }
            })?;

        Self::decode(content_type, &bytes)
    }

    /// Build a response carrying `value` encoded as `content_type`
    ///
    /// The `Content-Type` header and `status` are always set. If encoding fails the error
    /// is logged and a plain-text 500 body is returned instead. For an unknown content
    /// type the error is logged and the response has no body.
    pub fn write_response<T: Serialize + ?Sized>(
        &self,
        content_type: &ContentType,
        status: StatusCode,
        value: &T,
    ) -> Response {
        debug!(status = %status, content_type = %content_type, "writing response payload");

        let mut headers = HeaderMap::new();
        if let Some(header_value) = content_type.header_value() {
            headers.insert(header::CONTENT_TYPE, header_value);
        } else {
            warn!(content_type = %content_type, "content type is not a valid header value");
        }

        match content_type.encode(value) {
            Ok(body) => (status, headers, body).into_response(),
            Err(PayloadError::UnsupportedContentType { content_type }) => {
                error!(%content_type, "unknown content type, no response body written");
                (status, headers, Body::empty()).into_response()
            }
            Err(err) => {
                error!(error = %err, "failed to write payload to response");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, PLAIN_TEXT)],
                    err.to_string(),
                )
                    .into_response()
            }
        }
    }

    /// Read the whole body of a client response and decode it as `content_type`
    ///
    /// The response is consumed and its body released on return.
    ///
    /// # Errors
    ///
    /// - [`PayloadError::ResponseBody`] if the body cannot be read
    /// - [`PayloadError::BodyTooLarge`] if the body exceeds the limit
    /// - [`PayloadError::Decode`] if the bytes are not valid for `content_type`
    /// - [`PayloadError::UnsupportedContentType`] for an unknown content type
    pub async fn read_response<T: DeserializeOwned>(
        &self,
        content_type: &ContentType,
        mut response: reqwest::Response,
    ) -> PayloadResult<T> {
        debug!(url = %response.url(), status = %response.status(), "reading response body");

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|source| {
            error!(error = %source, "failed to read response body");
            PayloadError::ResponseBody { source }
        })? {
            if body.len() + chunk.len() > self.body_limit {
                error!(limit = self.body_limit, "response body exceeds limit");
                return Err(PayloadError::BodyTooLarge {
                    limit: self.body_limit,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Self::decode(content_type, &body)
    }

    fn decode<T: DeserializeOwned>(content_type: &ContentType, bytes: &[u8]) -> PayloadResult<T> {
        content_type.decode(bytes).inspect_err(|err| match err {
            PayloadError::UnsupportedContentType { content_type } => {
                error!(%content_type, "unknown content type, payload not decoded");
            }
            other => error!(error = %other, "failed to unmarshal payload"),
        })
    }
}
