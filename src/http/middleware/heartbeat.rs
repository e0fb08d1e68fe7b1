//! Liveness endpoint answered before the rest of the stack runs.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

pub const DEFAULT_HEALTH_PATH: &str = "/healthz";

/// Answer `GET`/`HEAD` on the health path with `200 .`; pass everything else on.
///
/// The path comparison is case-insensitive.
pub async fn heartbeat(State(path): State<Arc<str>>, request: Request, next: Next) -> Response {
    let method = request.method();
    if (method == Method::GET || method == Method::HEAD)
        && request.uri().path().eq_ignore_ascii_case(&path)
    {
        return (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], ".").into_response();
    }
    next.run(request).await
}
