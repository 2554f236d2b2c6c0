// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for payload reading and writing

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::content_type::ContentType;

/// Errors raised while reading or writing a payload
#[derive(Error, Debug)]
pub enum PayloadError {
    /// The inbound request body could not be read
    #[error("Failed to read request body: {source}")]
    RequestBody {
        /// Underlying body error
        source: axum::Error,
    },

    /// The client response body could not be read
    #[error("Failed to read response body: {source}")]
    ResponseBody {
        /// Underlying transport error
        source: reqwest::Error,
    },

    /// The body is larger than the configured limit
    #[error("Body exceeds the limit of {limit} bytes")]
    BodyTooLarge {
        /// Configured limit in bytes
        limit: usize,
    },

    /// The body is not a valid payload for the declared content type
    #[error("Failed to decode {content_type} payload: {message}")]
    Decode {
        /// Declared content type
        content_type: ContentType,
        /// Decoder error message
        message: String,
    },

    /// The value could not be encoded with the requested content type
    #[error("Failed to encode {content_type} payload: {message}")]
    Encode {
        /// Requested content type
        content_type: ContentType,
        /// Encoder error message
        message: String,
    },

    /// No encoder/decoder exists for the content type
    #[error("Unsupported content type: {content_type}")]
    UnsupportedContentType {
        /// Raw content type value
        content_type: String,
    },

    /// The request carries no `Content-Type` header
    #[error("Missing Content-Type header")]
    MissingContentType,
}

/// Result type for payload operations
pub type PayloadResult<T> = Result<T, PayloadError>;

impl PayloadError {
    /// Whether the failure happened while transferring the body bytes
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::RequestBody { .. } | Self::ResponseBody { .. } | Self::BodyTooLarge { .. }
        )
    }

    /// Whether the body was read but could not be decoded
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// HTTP status a handler should answer with when it rejects a request for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RequestBody { .. } | Self::Decode { .. } => StatusCode::BAD_REQUEST,
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedContentType { .. } | Self::MissingContentType => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            Self::ResponseBody { .. } => StatusCode::BAD_GATEWAY,
            Self::Encode { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PayloadError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));
        (status, body).into_response()
    }
}
