// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Built-in HTTP request handlers

use axum::{http::StatusCode, response::Response};
use payload::{ContentType, Payload};
use serde::{Deserialize, Serialize};

/// Status reported while the server is accepting requests
pub const STATUS_UP: &str = "UP";

/// Health report returned by `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Service status
    pub status: String,
}

impl HealthReport {
    /// Report for a running service
    pub fn up() -> Self {
        Self {
            status: STATUS_UP.to_string(),
        }
    }
}

/// Health check endpoint handler
pub async fn health_handler() -> Response {
    Payload::new().write_response(&ContentType::Json, StatusCode::OK, &HealthReport::up())
}
