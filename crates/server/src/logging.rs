// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Logging module
//!
//! Installs the process-wide `tracing` subscriber and provides [`Logger`], the service
//! logging context that is created once by the process and handed to the server. The
//! server binds it to every request, and handlers get it back through
//! [`RequestLogger`].

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{Extensions, request::Parts},
};
use tracing::{Span, info_span};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    config::{LogConfig, LogFormat},
    error::{ServerError, ServerResult},
};

const FALLBACK_LOGGER_NAME: &str = "fallback";

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Errors
///
/// Returns `ServerError::Logging` for an invalid filter directive or when a global
/// subscriber is already installed.
pub fn init(config: &LogConfig) -> ServerResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ServerError::Logging {
            message: format!("invalid log level '{}': {e}", config.level),
        })?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };

    result.map_err(|e| ServerError::Logging {
        message: e.to_string(),
    })
}

/// Logging context of a service
///
/// Wraps the root span of the service; spans created for requests and for the server
/// lifecycle are its children.
#[derive(Debug, Clone)]
pub struct Logger {
    span: Span,
}

impl Logger {
    /// Create the logging context for the named service
    pub fn new(service: &str) -> Self {
        Self {
            span: info_span!("service", name = %service),
        }
    }

    /// Logging context used when none was bound to a request
    pub fn fallback() -> Self {
        Self::new(FALLBACK_LOGGER_NAME)
    }

    /// Logger bound to a request's extensions, or the fallback
    pub fn from_extensions(extensions: &Extensions) -> Self {
        extensions
            .get::<Self>()
            .cloned()
            .unwrap_or_else(Self::fallback)
    }

    /// Root span of the service
    pub fn span(&self) -> &Span {
        &self.span
    }
}

/// Extractor for the [`Logger`] bound to the current request
///
/// Never rejects: a request without a bound logger gets the fallback one.
#[derive(Debug, Clone)]
pub struct RequestLogger(pub Logger);

impl<S> FromRequestParts<S> for RequestLogger
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(Logger::from_extensions(&parts.extensions)))
    }
}
