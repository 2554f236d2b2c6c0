// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! This module provides the error types for server construction and lifecycle
//! operations. Lifecycle errors are terminal for a server instance: they are logged
//! by the lifecycle manager and never retried.

use std::{net::SocketAddr, path::PathBuf};

use thiserror::Error;

/// Comprehensive error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid route definitions
    #[error("Route error: {message}")]
    Route {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// TLS certificate or key could not be loaded
    #[error("Failed to load TLS material from {cert_file:?} and {key_file:?}: {source}")]
    Tls {
        /// Certificate path
        cert_file: PathBuf,
        /// Private key path
        key_file: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Errors returned by the serve loop
    #[error("Serve loop failed: {source}")]
    Serve {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Timeout errors for operations that exceed time limits
    #[error("Operation timed out after {timeout_seconds} seconds")]
    Timeout {
        /// Timeout duration in seconds
        timeout_seconds: u64,
    },

    /// Signal handling errors
    #[error("Signal handling error: {message}")]
    Signal {
        /// Error message
        message: String,
    },

    /// Logging subscriber errors
    #[error("Logging setup failed: {message}")]
    Logging {
        /// Error message
        message: String,
    },
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = ServerError::Timeout { timeout_seconds: 10 };
        assert_eq!(err.to_string(), "Operation timed out after 10 seconds");

        let err = ServerError::Route {
            message: "pattern must start with '/'".to_string(),
        };
        assert_eq!(err.to_string(), "Route error: pattern must start with '/'");
    }

    #[test]
    fn bind_error_names_address() {
        let err = ServerError::Bind {
            address: SocketAddr::from(([127, 0, 0, 1], 80)),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };
        assert!(err.to_string().contains("127.0.0.1:80"));
    }
}
