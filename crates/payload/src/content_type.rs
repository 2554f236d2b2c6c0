// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Content type definitions
//!
//! Maps the supported wire media types to a single enumerated value and owns the
//! encoder/decoder dispatch for each of them.

use std::fmt;

use axum::http::{HeaderMap, HeaderValue, header};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{PayloadError, PayloadResult};

/// Wire value for JSON payloads
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=UTF-8";
/// Wire value for XML payloads
pub const CONTENT_TYPE_XML: &str = "application/xml; charset=UTF-8";
/// Wire value for YAML payloads
pub const CONTENT_TYPE_YAML: &str = "application/x-yaml";

/// Content type of a payload
///
/// Every known variant has exactly one encoder and one decoder. Anything that is not
/// recognised is kept as [`ContentType::Unknown`] with the raw value so callers can
/// report it, it is never treated as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// `application/json; charset=UTF-8`
    Json,
    /// `application/xml; charset=UTF-8`
    Xml,
    /// `application/x-yaml`
    Yaml,
    /// Unrecognised media type, holding the raw value
    Unknown(String),
}

impl ContentType {
    /// Parse a `Content-Type` value
    ///
    /// Matching is done on the media type essence, parameters such as `charset` and
    /// letter case are ignored.
    pub fn parse(value: &str) -> Self {
        let essence = value
            .split_once(';')
            .map_or(value, |(essence, _)| essence)
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/json" => Self::Json,
            "application/xml" | "text/xml" => Self::Xml,
            "application/x-yaml" | "application/yaml" | "text/yaml" | "text/x-yaml" => Self::Yaml,
            _ => Self::Unknown(value.to_string()),
        }
    }

    /// Content type declared by a header map, `None` when the header is absent
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(header::CONTENT_TYPE)
            .map(|value| Self::parse(&String::from_utf8_lossy(value.as_bytes())))
    }

    /// Canonical wire value, or the raw value for [`ContentType::Unknown`]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Json => CONTENT_TYPE_JSON,
            Self::Xml => CONTENT_TYPE_XML,
            Self::Yaml => CONTENT_TYPE_YAML,
            Self::Unknown(raw) => raw,
        }
    }

    /// Header value to send, `None` if an unknown value is not a legal header value
    pub fn header_value(&self) -> Option<HeaderValue> {
        match self {
            Self::Json => Some(HeaderValue::from_static(CONTENT_TYPE_JSON)),
            Self::Xml => Some(HeaderValue::from_static(CONTENT_TYPE_XML)),
            Self::Yaml => Some(HeaderValue::from_static(CONTENT_TYPE_YAML)),
            Self::Unknown(raw) => HeaderValue::from_str(raw).ok(),
        }
    }

    /// Whether an encoder/decoder pair exists for this content type
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Decode `bytes` into `T`
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> PayloadResult<T> {
        match self {
            Self::Json => serde_json::from_slice(bytes).map_err(|e| self.decode_error(e)),
            Self::Xml => {
                let text = std::str::from_utf8(bytes).map_err(|e| self.decode_error(e))?;
                quick_xml::de::from_str(text).map_err(|e| self.decode_error(e))
            }
            Self::Yaml => serde_yaml::from_slice(bytes).map_err(|e| self.decode_error(e)),
            Self::Unknown(raw) => Err(PayloadError::UnsupportedContentType {
                content_type: raw.clone(),
            }),
        }
    }

    /// Encode `value` into bytes
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> PayloadResult<Vec<u8>> {
        match self {
            Self::Json => serde_json::to_vec(value).map_err(|e| self.encode_error(e)),
            Self::Xml => quick_xml::se::to_string(value)
                .map(String::into_bytes)
                .map_err(|e| self.encode_error(e)),
            Self::Yaml => serde_yaml::to_string(value)
                .map(String::into_bytes)
                .map_err(|e| self.encode_error(e)),
            Self::Unknown(raw) => Err(PayloadError::UnsupportedContentType {
                content_type: raw.clone(),
            }),
        }
    }

    fn decode_error(&self, err: impl fmt::Display) -> PayloadError {
        PayloadError::Decode {
            content_type: self.clone(),
            message: err.to_string(),
        }
    }

    fn encode_error(&self, err: impl fmt::Display) -> PayloadError {
        PayloadError::Encode {
            content_type: self.clone(),
            message: err.to_string(),
        }
    }
}

impl From<&str> for ContentType {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
