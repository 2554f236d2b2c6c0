// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server implementation module
//!
//! [`Server`] owns the HTTP engine for one service. [`Server::start`] runs the engine
//! on a background task and blocks until a termination trigger arrives: SIGINT,
//! SIGTERM, a [`ServerHandle::shutdown`] request, or the engine failing. Shutdown then
//! stops accepting connections and gives in-flight requests a bounded grace period;
//! connections still open at the deadline are closed.
//!
//! A trailing slash is trimmed before routing, so `/health/` is served as `/health`.

use std::{fmt, io::ErrorKind, net::SocketAddr, time::Duration};

use axum::{Extension, Router, ServiceExt, body::Body, http::HeaderName};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use hyper::Request;
use tokio::sync::{oneshot, watch};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    normalize_path::NormalizePath,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::{
    config::{ServerConfig, TlsConfig},
    error::{ServerError, ServerResult},
    logging::Logger,
    metrics::record_shutdown,
    routes::{Routes, create_router},
};

// Server constants
const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_FORCE_SHUTDOWN_TIMEOUT_SECONDS: u64 = 5;
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Configuration for server shutdown behavior
#[derive(Debug, Clone)]
pub struct ShutdownConfig {
    /// Time in-flight requests get to finish once shutdown begins
    pub graceful_timeout: Duration,
    /// Time the serve task gets to exit after the graceful phase before it is aborted
    pub force_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            graceful_timeout: Duration::from_secs(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT_SECONDS),
            force_timeout: Duration::from_secs(DEFAULT_FORCE_SHUTDOWN_TIMEOUT_SECONDS),
        }
    }
}

/// Lifecycle of a server instance; states only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, engine not started
    Created,
    /// Engine running on its background task
    Running,
    /// Termination trigger received, draining connections
    ShuttingDown,
    /// Engine stopped, `start` has returned or is about to
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::ShuttingDown => write!(f, "shutting_down"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Cloneable remote control for a [`Server`]
///
/// Stays usable after [`Server::start`] has consumed the server.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    cancellation_token: CancellationToken,
    engine: Handle,
    state: watch::Receiver<LifecycleState>,
}

impl ServerHandle {
    /// Request a graceful shutdown, equivalent to receiving SIGTERM
    pub fn shutdown(&self) {
        info!("programmatic shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Wait for the engine to bind and return the address it listens on
    ///
    /// Returns `None` when the server stopped without ever listening.
    pub async fn listening(&self) -> Option<SocketAddr> {
        tokio::select! {
            biased;
            address = self.engine.listening() => address,
            () = self.stopped() => None,
        }
    }

    /// Wait until the server reached [`LifecycleState::Stopped`]
    pub async fn stopped(&self) {
        let mut state = self.state.clone();
        // a dropped sender means the server is gone, which is as good as stopped
        let _ = state
            .wait_for(|state| *state == LifecycleState::Stopped)
            .await;
    }

    /// Returns a clone of the cancellation token that triggers shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }
}

/// Main server struct
#[derive(Debug)]
pub struct Server {
    /// Server configuration
    config: ServerConfig,
    /// Parsed listen address
    address: SocketAddr,
    /// Application router behind trailing-slash normalization
    router: NormalizePath<Router>,
    /// Service logging context
    logger: Logger,
    /// Engine handle, used for graceful shutdown and connection tracking
    engine: Handle,
    /// Cancellation token for coordinated shutdown
    cancellation_token: CancellationToken,
    /// Cancelled by the serve task when the engine fails
    engine_failure: CancellationToken,
    /// Configuration for coordinated shutdown
    shutdown_config: ShutdownConfig,
    /// Lifecycle state publisher
    state: watch::Sender<LifecycleState>,
}

impl Server {
    /// Create a server for a route table
    ///
    /// Does not bind or read TLS material; that happens in [`Server::start`].
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the configuration is invalid.
    pub fn new(
        config: ServerConfig,
        shutdown_config: ShutdownConfig,
        routes: Routes,
        logger: Logger,
    ) -> ServerResult<Self> {
        config.validate()?;
        let address = config.socket_addr()?;
        let router = Self::create_router(&config, routes, &logger);
        let (state, _) = watch::channel(LifecycleState::Created);

        Ok(Self {
            config,
            address,
            router,
            logger,
            engine: Handle::new(),
            cancellation_token: CancellationToken::new(),
            engine_failure: CancellationToken::new(),
            shutdown_config,
            state,
        })
    }

    /// Create application router with middleware
    fn create_router(
        config: &ServerConfig,
        routes: Routes,
        logger: &Logger,
    ) -> NormalizePath<Router> {
        let timeout_duration = config.request_timeout_seconds.value();
        let request_logger = logger.clone();

        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(move |req: &Request<_>| {
                    let parent = request_logger.span();
                    if let Some(request_id) = req.headers().get(REQUEST_ID_HEADER) {
                        info_span!(
                            parent: parent,
                            "http_request",
                            method = %req.method(),
                            uri = %req.uri(),
                            ?request_id,
                        )
                    } else {
                        error!(parent: parent, "failed to extract id from request");
                        info_span!(
                            parent: parent,
                            "http_request",
                            method = %req.method(),
                            uri = %req.uri(),
                            request_id = "unknown",
                        )
                    }
                }),
            )
            .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
            .layer(Extension(logger.clone()))
            .layer(TimeoutLayer::new(timeout_duration));

        NormalizePath::trim_trailing_slash(create_router(routes).layer(middleware))
    }

    /// Remote control that outlives [`Server::start`]
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            cancellation_token: self.cancellation_token.clone(),
            engine: self.engine.clone(),
            state: self.state.subscribe(),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns a clone of the cancellation token for coordinated shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Initiates graceful shutdown by cancelling the server's cancellation token
    pub fn shutdown(&self) {
        info!(parent: self.logger.span(), "programmatic shutdown requested");
        self.cancellation_token.cancel();
    }

    /// Run the engine and block until it has shut down
    ///
    /// Engine failures (bind, TLS, serve loop) are logged and treated as a
    /// termination trigger; they are never returned.
    pub async fn start(self) {
        let span = info_span!(parent: self.logger.span(), "server", address = %self.address);
        self.run().instrument(span).await;
    }

    async fn run(self) {
        let (done_tx, done_rx) = oneshot::channel::<()>();
        let serve = Self::serve(
            self.address,
            self.config.tls.clone(),
            self.router.clone(),
            self.engine.clone(),
        );
        let engine_failure = self.engine_failure.clone();

        let serve_task = tokio::spawn(
            async move {
                if let Err(e) = serve.await {
                    error!(error = %e, "http server stopped unexpectedly");
                    engine_failure.cancel();
                }
                // the receiver may already have given up on us
                let _ = done_tx.send(());
            }
            .in_current_span(),
        );

        self.set_state(LifecycleState::Running);
        info!(
            tls = self.config.tls.enabled,
            environment = %self.config.environment,
            "http server starting",
        );

        self.wait_shutdown().await;

        match tokio::time::timeout(self.shutdown_config.force_timeout, done_rx).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => warn!("serve task ended without reporting completion"),
            Err(_) => {
                error!(
                    force_timeout_ms = self.shutdown_config.force_timeout.as_millis(),
                    "serve task did not exit in time, aborting it",
                );
                serve_task.abort();
            }
        }

        self.set_state(LifecycleState::Stopped);
        info!("http server stopped");
    }

    async fn serve(
        address: SocketAddr,
        tls: TlsConfig,
        router: NormalizePath<Router>,
        engine: Handle,
    ) -> ServerResult<()> {
        let service = ServiceExt::<Request<Body>>::into_make_service(router);

        let result = if tls.enabled {
            let rustls_config = RustlsConfig::from_pem_file(&tls.cert_file, &tls.key_file)
                .await
                .map_err(|source| ServerError::Tls {
                    cert_file: tls.cert_file.clone(),
                    key_file: tls.key_file.clone(),
                    source,
                })?;
            axum_server::bind_rustls(address, rustls_config)
                .handle(engine)
                .serve(service)
                .await
        } else {
            axum_server::bind(address)
                .handle(engine)
                .serve(service)
                .await
        };

        result.map_err(|source| match source.kind() {
            ErrorKind::AddrInUse | ErrorKind::AddrNotAvailable | ErrorKind::PermissionDenied => {
                ServerError::Bind { address, source }
            }
            _ => ServerError::Serve { source },
        })
    }

    /// Block until a termination trigger arrives, then shut the engine down
    ///
    /// Stops accepting new connections and waits up to the graceful timeout for open
    /// connections to finish. Connections still open at the deadline are closed and
    /// the overrun is logged. A failed engine has nothing to drain.
    pub async fn wait_shutdown(&self) {
        let trigger = tokio::select! {
            signal = shutdown_signal() => signal,
            () = self.engine_failure.cancelled() => "engine failure",
            () = self.cancellation_token.cancelled() => "shutdown request",
        };
        warn!(trigger, "termination trigger received, stopping http server");
        self.cancellation_token.cancel();
        self.set_state(LifecycleState::ShuttingDown);

        if self.engine_failure.is_cancelled() {
            error!("http server failed, no connections to drain");
            record_shutdown("failed");
            return;
        }

        let deadline = self.shutdown_config.graceful_timeout;
        self.engine.graceful_shutdown(Some(deadline));

        match tokio::time::timeout(deadline, self.drained()).await {
            Ok(()) => {
                info!("http server shut down gracefully");
                record_shutdown("graceful");
            }
            Err(_) => {
                let err = ServerError::Timeout {
                    timeout_seconds: deadline.as_secs(),
                };
                error!(
                    error = %err,
                    open_connections = self.engine.connection_count(),
                    "graceful shutdown deadline exceeded, closing remaining connections",
                );
                record_shutdown("deadline_exceeded");
            }
        }
    }

    async fn drained(&self) {
        while self.engine.connection_count() > 0 {
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }
    }

    fn set_state(&self, state: LifecycleState) {
        let previous = self.state.send_replace(state);
        debug!(from = %previous, to = %state, "lifecycle state changed");
    }
}

/// Wait for SIGINT or SIGTERM and return the signal name
///
/// When handlers cannot be installed the failure is logged and this never resolves,
/// leaving programmatic shutdown as the only trigger.
async fn shutdown_signal() -> &'static str {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
            },
            (Err(e), _) | (_, Err(e)) => {
                let err = ServerError::Signal {
                    message: e.to_string(),
                };
                error!(error = %err, "failed to install signal handlers");
                std::future::pending().await
            }
        }
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "CTRL+C",
            Err(e) => {
                let err = ServerError::Signal {
                    message: e.to_string(),
                };
                error!(error = %err, "failed to install CTRL+C handler");
                std::future::pending().await
            }
        }
    }
}
