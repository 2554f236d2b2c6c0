// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Content-type polymorphic payload codec
//!
//! Reads and writes HTTP payloads in JSON, XML or YAML through one enumerated dispatch,
//! so request bodies, response bodies and client response bodies all follow the same
//! content-negotiation rules.
//!
//! # Module Structure
//!
//! - [`content_type`]: the [`ContentType`] enum, its wire values and encoder/decoder dispatch
//! - [`codec`]: the [`Payload`] codec with `read_request`, `write_response` and `read_response`
//! - [`extractors`]: the [`Negotiated`] extractor driven by the request's own header
//! - [`error`]: [`PayloadError`] and its HTTP status mapping
//!
//! # Example
//!
//! ```no_run
//! use axum::{extract::Request, http::StatusCode, response::Response};
//! use payload::{ContentType, Payload};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Note {
//!     text: String,
//! }
//!
//! async fn create_note(request: Request) -> Response {
//!     let payload = Payload::new();
//!     match payload.read_request::<Note>(&ContentType::Json, request).await {
//!         Ok(note) => payload.write_response(&ContentType::Json, StatusCode::CREATED, &note),
//!         Err(err) => payload.write_response(
//!             &ContentType::Json,
//!             err.status_code(),
//!             &serde_json::json!({ "error": err.to_string() }),
//!         ),
//!     }
//! }
//! ```

pub mod codec;
pub mod content_type;
pub mod error;
pub mod extractors;

pub use codec::{DEFAULT_BODY_LIMIT, Payload};
pub use content_type::{CONTENT_TYPE_JSON, CONTENT_TYPE_XML, CONTENT_TYPE_YAML, ContentType};
pub use error::{PayloadError, PayloadResult};
pub use extractors::Negotiated;
