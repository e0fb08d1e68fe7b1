//! Standard middleware composition.
//!
//! # Layer Order (outermost first)
//! ```text
//! heartbeat      → answers the health path, nothing below runs
//! request id     → accept or generate x-request-id, echo it on the response
//! real ip        → ClientAddr extension from proxy headers or the peer
//! request logger → one "HTTP request" record per request
//! metrics        → request counter and latency histogram
//! catch panic    → panics become a plain 500
//! router
//! ```
//!
//! # Design Decisions
//! - The order is fixed; services that need something else compose the
//!   middlewares themselves
//! - Panic recovery sits innermost so a panicking handler is still logged and
//!   counted as a 500

use std::sync::Arc;

use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
};

use crate::http::middleware::{heartbeat, real_ip, recover_from_panic};
use crate::observability::{request_logger, track_metrics, HttpMetrics};

/// Wrap `router` in the standard middleware stack.
pub fn bind_standard_middleware(router: Router, health_path: &str, metrics: HttpMetrics) -> Router {
    let health_path: Arc<str> = Arc::from(health_path);

    router.layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn_with_state(health_path, heartbeat))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(middleware::from_fn(real_ip))
            .layer(middleware::from_fn(request_logger))
            .layer(middleware::from_fn_with_state(metrics, track_metrics))
            .layer(CatchPanicLayer::custom(recover_from_panic)),
    )
}
