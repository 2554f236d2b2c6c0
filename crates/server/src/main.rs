// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Demo service
//!
//! Serves `POST /echo` next to the built-in endpoints. The echo handler answers in the
//! content type the request was sent in.

use anyhow::Result;
use axum::{http::StatusCode, response::Response};
use payload::{Negotiated, Payload};
use serde::{Deserialize, Serialize};
use server::{
    Logger, RequestLogger, Route, Server, ServerConfig, ShutdownConfig, logging,
};
use tracing::info;

/// Body accepted and returned by `POST /echo`
#[derive(Debug, Serialize, Deserialize)]
struct Message {
    text: String,
}

async fn echo_handler(
    RequestLogger(logger): RequestLogger,
    Negotiated {
        content_type,
        value,
    }: Negotiated<Message>,
) -> Response {
    info!(parent: logger.span(), %content_type, "echoing message");
    Payload::new().write_response(&content_type, StatusCode::OK, &value)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env()?;
    logging::init(&config.log)?;

    let logger = Logger::new(env!("CARGO_PKG_NAME"));
    info!(
        parent: logger.span(),
        address = %config.address,
        environment = %config.environment,
        "starting service",
    );

    let routes = vec![Route::post("echo", "/echo", echo_handler)?];
    let server = Server::new(config, ShutdownConfig::default(), routes, logger)?;

    // NOTE: the `#[tokio::main]` task does not run a worker future, we must spawn
    tokio::spawn(server.start()).await?;

    Ok(())
}
