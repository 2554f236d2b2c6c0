// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! A [`Route`] pairs a name with a method, a path pattern and a handler. The name is
//! the `route` label of the request metrics. [`create_router`] turns a route table
//! into an Axum router and appends the built-in `GET /health` and `GET /metrics`
//! endpoints.
//!
//! Patterns use Axum's capture syntax: `/users/{id}` for a single segment and
//! `/files/{*path}` for the remainder of the path. When two routes share a method and
//! a pattern the first one wins; the later one is skipped with a warning. A route that
//! matches a built-in endpoint shadows it. Any other pattern the path matcher cannot
//! hold next to an earlier one (`/x/{id}` after `/x/{*rest}`) is skipped the same way.

pub mod handlers;

use std::collections::HashSet;

use axum::{
    Router,
    handler::Handler,
    http::Method,
    middleware,
    routing::{MethodFilter, MethodRouter, get, on},
};
use handlers::health_handler;
use tracing::warn;

use crate::{
    error::{ServerError, ServerResult},
    metrics::{RouteLabel, metrics_handler, track_route},
};

/// Route name of the built-in health endpoint
pub const HEALTH_ROUTE: &str = "health";
/// Route name of the built-in metrics endpoint
pub const METRICS_ROUTE: &str = "metrics";

/// A named HTTP endpoint
#[derive(Debug)]
pub struct Route {
    name: String,
    method: Method,
    pattern: String,
    handler: MethodRouter,
}

/// Ordered route table handed to the server
pub type Routes = Vec<Route>;

impl Route {
    /// Create a route
    ///
    /// # Arguments
    /// * `name` - Route name, used as the metrics label
    /// * `method` - HTTP method the route answers
    /// * `pattern` - Path pattern, starting with `/`
    /// * `handler` - Any Axum handler
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Route` for a malformed pattern or a method Axum cannot
    /// route on.
    pub fn new<H, T>(
        name: impl Into<String>,
        method: Method,
        pattern: impl Into<String>,
        handler: H,
    ) -> ServerResult<Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        let name = name.into();
        let pattern = pattern.into();
        validate_pattern(&name, &pattern)?;

        let filter = MethodFilter::try_from(method.clone()).map_err(|e| ServerError::Route {
            message: format!("route '{name}': {e}"),
        })?;

        Ok(Self {
            handler: on(filter, handler),
            name,
            method,
            pattern,
        })
    }

    /// Create a `GET` route
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Route` for a malformed pattern.
    pub fn get<H, T>(
        name: impl Into<String>,
        pattern: impl Into<String>,
        handler: H,
    ) -> ServerResult<Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::new(name, Method::GET, pattern, handler)
    }

    /// Create a `POST` route
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Route` for a malformed pattern.
    pub fn post<H, T>(
        name: impl Into<String>,
        pattern: impl Into<String>,
        handler: H,
    ) -> ServerResult<Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::new(name, Method::POST, pattern, handler)
    }

    /// Create a `PUT` route
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Route` for a malformed pattern.
    pub fn put<H, T>(
        name: impl Into<String>,
        pattern: impl Into<String>,
        handler: H,
    ) -> ServerResult<Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::new(name, Method::PUT, pattern, handler)
    }

    /// Create a `DELETE` route
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Route` for a malformed pattern.
    pub fn delete<H, T>(
        name: impl Into<String>,
        pattern: impl Into<String>,
        handler: H,
    ) -> ServerResult<Self>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self::new(name, Method::DELETE, pattern, handler)
    }

    /// Route name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

fn builtin_routes() -> Routes {
    vec![
        Route {
            name: HEALTH_ROUTE.to_string(),
            method: Method::GET,
            pattern: "/health".to_string(),
            handler: get(health_handler),
        },
        Route {
            name: METRICS_ROUTE.to_string(),
            method: Method::GET,
            pattern: "/metrics".to_string(),
            handler: get(metrics_handler),
        },
    ]
}

/// Build the application router from a route table plus the built-in endpoints
///
/// Every route is wrapped in the metrics middleware under its own name.
pub fn create_router(routes: Routes) -> Router {
    // (shape, pattern, handlers), in registration order
    let mut table: Vec<(String, String, MethodRouter)> = Vec::new();
    let mut registered: HashSet<(String, Method)> = HashSet::new();
    // same matcher the router uses, so conflicts surface here instead of as a panic
    let mut paths: matchit::Router<()> = matchit::Router::new();

    for route in routes.into_iter().chain(builtin_routes()) {
        let shape = pattern_shape(&route.pattern);

        if !registered.insert((shape.clone(), route.method.clone())) {
            warn!(
                route = %route.name,
                method = %route.method,
                pattern = %route.pattern,
                "route shadowed by an earlier route with the same method and pattern, skipping",
            );
            continue;
        }

        let handler = route.handler.route_layer(middleware::from_fn_with_state(
            RouteLabel(route.name.clone()),
            track_route,
        ));

        match table.iter_mut().find(|(existing, ..)| *existing == shape) {
            Some((_, pattern, methods)) if *pattern == route.pattern => {
                let merged = std::mem::replace(methods, MethodRouter::new()).merge(handler);
                *methods = merged;
            }
            Some((_, pattern, _)) => {
                // Axum rejects one path registered under two capture names
                warn!(
                    route = %route.name,
                    pattern = %route.pattern,
                    registered = %pattern,
                    "route captures conflict with an earlier pattern, skipping",
                );
            }
            None => {
                if let Err(e) = paths.insert(route.pattern.clone(), ()) {
                    warn!(
                        route = %route.name,
                        pattern = %route.pattern,
                        error = %e,
                        "route conflicts with an earlier pattern, skipping",
                    );
                    continue;
                }
                table.push((shape, route.pattern, handler));
            }
        }
    }

    table
        .into_iter()
        .fold(Router::new(), |router, (_, pattern, methods)| {
            router.route(&pattern, methods)
        })
}

/// Pattern with capture names erased, so `/users/{id}` and `/users/{name}` compare equal
fn pattern_shape(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| match segment.strip_prefix('{') {
            Some(inner) if inner.starts_with('*') => "{*}",
            Some(_) => "{}",
            None => segment,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn validate_pattern(name: &str, pattern: &str) -> ServerResult<()> {
    let invalid = |reason: &str| {
        Err(ServerError::Route {
            message: format!("route '{name}' has invalid pattern '{pattern}': {reason}"),
        })
    };

    if !pattern.starts_with('/') {
        return invalid("must start with '/'");
    }

    let segments: Vec<&str> = pattern.split('/').skip(1).collect();
    for (index, segment) in segments.iter().enumerate() {
        if segment.starts_with(':') || segment.starts_with('*') {
            return invalid("captures are written as '{name}' or '{*name}'");
        }
        if !segment.contains(['{', '}']) {
            continue;
        }

        let capture = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .filter(|inner| !inner.is_empty() && !inner.contains(['{', '}']));
        let Some(capture) = capture else {
            return invalid("a capture must span a whole segment");
        };

        if let Some(rest) = capture.strip_prefix('*') {
            if rest.is_empty() {
                return invalid("a catch-all capture needs a name");
            }
            if index + 1 != segments.len() {
                return invalid("a catch-all capture must be the last segment");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        extract::Path,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;

    async fn call(router: &Router, method: Method, uri: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("request should build");
        let response = router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {});
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    #[test]
    fn patterns_are_validated() {
        assert!(validate_pattern("ok", "/").is_ok());
        assert!(validate_pattern("ok", "/users/{id}").is_ok());
        assert!(validate_pattern("ok", "/files/{*path}").is_ok());

        for pattern in [
            "users",
            "/users/:id",
            "/files/*path",
            "/users/{id",
            "/users/x{id}",
            "/users/{}",
            "/files/{*}",
            "/files/{*path}/meta",
        ] {
            let result = validate_pattern("bad", pattern);
            assert!(
                matches!(result, Err(ServerError::Route { .. })),
                "{pattern} should be rejected"
            );
        }
    }

    #[test]
    fn shapes_ignore_capture_names() {
        assert_eq!(pattern_shape("/users/{id}"), pattern_shape("/users/{name}"));
        assert_eq!(pattern_shape("/files/{*path}"), "/files/{*}");
        assert_ne!(pattern_shape("/users/{id}"), pattern_shape("/users/me"));
    }

    #[test]
    fn route_accessors() {
        let route = Route::put("update", "/items/{id}", || async { "ok" })
            .expect("route should be valid");
        assert_eq!(route.name(), "update");
        assert_eq!(route.method(), &Method::PUT);
        assert_eq!(route.pattern(), "/items/{id}");
    }

    #[tokio::test]
    async fn builtin_endpoints_are_served() {
        let router = create_router(Vec::new());

        let (status, body) = call(&router, Method::GET, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"UP"}"#);

        let (status, _) = call(&router, Method::GET, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn first_duplicate_route_wins() {
        let router = create_router(vec![
            Route::get("first", "/dup", || async { "first" }).expect("valid route"),
            Route::get("second", "/dup", || async { "second" }).expect("valid route"),
        ]);

        let (status, body) = call(&router, Method::GET, "/dup").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "first");
    }

    #[tokio::test]
    async fn user_route_shadows_builtin_health() {
        let router = create_router(vec![
            Route::get("custom_health", "/health", || async { "custom" }).expect("valid route"),
        ]);

        let (_, body) = call(&router, Method::GET, "/health").await;
        assert_eq!(body, "custom");
    }

    #[tokio::test]
    async fn methods_on_one_pattern_are_merged() {
        let router = create_router(vec![
            Route::get("read", "/items/{id}", |Path(id): Path<String>| async move {
                format!("read {id}")
            })
            .expect("valid route"),
            Route::delete("remove", "/items/{id}", |Path(id): Path<String>| async move {
                format!("remove {id}")
            })
            .expect("valid route"),
        ]);

        let (_, body) = call(&router, Method::GET, "/items/7").await;
        assert_eq!(body, "read 7");
        let (_, body) = call(&router, Method::DELETE, "/items/7").await;
        assert_eq!(body, "remove 7");

        let (status, _) = call(&router, Method::POST, "/items/7").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn conflicting_capture_names_keep_first_pattern() {
        let router = create_router(vec![
            Route::get("by_id", "/users/{id}", |Path(id): Path<String>| async move { id })
                .expect("valid route"),
            Route::post("by_name", "/users/{name}", || async { "never" })
                .expect("valid route"),
        ]);

        let (_, body) = call(&router, Method::GET, "/users/42").await;
        assert_eq!(body, "42");
        let (status, _) = call(&router, Method::POST, "/users/42").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn capture_and_catch_all_on_one_prefix_keep_first() {
        let router = create_router(vec![
            Route::get("by_id", "/x/{id}", |Path(id): Path<String>| async move { id })
                .expect("valid route"),
            Route::post("rest", "/x/{*rest}", || async { "never" }).expect("valid route"),
        ]);

        let (status, body) = call(&router, Method::GET, "/x/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "1");
        let (status, _) = call(&router, Method::POST, "/x/1").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, _) = call(&router, Method::GET, "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let router = create_router(Vec::new());
        let (status, _) = call(&router, Method::GET, "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
