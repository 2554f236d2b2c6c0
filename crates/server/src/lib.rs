// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP server lifecycle for a service
//!
//! This crate runs a route table on an Axum engine with request tracing, per-route
//! metrics, built-in health and metrics endpoints, and a bounded graceful shutdown on
//! SIGINT, SIGTERM or a programmatic request.
//!
//! # Module Structure
//!
//! - [`config`]: Server configuration and environment management with hierarchical loading
//! - [`error`]: Error types for construction and lifecycle failures
//! - [`logging`]: Global subscriber setup and the per-service [`Logger`]
//! - [`metrics`]: Prometheus request and shutdown metrics
//! - [`routes`]: Named routes, router assembly and the built-in endpoints
//! - [`server`]: Server lifecycle and coordinated shutdown
//!
//! # Example
//!
//! ```no_run
//! use server::{Logger, Route, Server, ServerConfig, ShutdownConfig};
//!
//! # async fn run() -> server::ServerResult<()> {
//! let routes = vec![Route::get("hello", "/hello", || async { "hello" })?];
//! let server = Server::new(
//!     ServerConfig::from_env()?,
//!     ShutdownConfig::default(),
//!     routes,
//!     Logger::new("hello-service"),
//! )?;
//! server.start().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod routes;
pub mod server;

pub use config::{Environment, LogConfig, LogFormat, ServerConfig, TlsConfig};
pub use error::{ServerError, ServerResult};
pub use logging::{Logger, RequestLogger};
pub use routes::{Route, Routes, create_router, handlers::HealthReport};
pub use server::{LifecycleState, Server, ServerHandle, ShutdownConfig};
