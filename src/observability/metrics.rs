//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Own the Prometheus recorder the HTTP metrics are written into
//! - Count requests and time them, per status code, method and route
//! - Render the registry in Prometheus text format
//!
//! # Metrics
//! - `http_requests_total{code,method,path}` (counter)
//! - `http_request_duration_ms{code,method,path}` (histogram, ms buckets
//!   100/250/500/1000/2500)
//!
//! # Design Decisions
//! - The registry is built explicitly and handed to whoever needs it; nothing
//!   is installed as the global `metrics` recorder
//! - Registering the HTTP metrics twice on one registry is an error
//! - `path` is the route pattern, never the raw path, to keep cardinality low

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};
use thiserror::Error;

use crate::routing::RouteTable;

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION_MS: &str = "http_request_duration_ms";

/// Histogram bucket upper bounds, in milliseconds.
pub const LATENCY_BUCKETS_MS: [f64; 5] = [100.0, 250.0, 500.0, 1000.0, 2500.0];

/// Route label used when neither the router nor the route table knows the path.
pub const UNKNOWN_ROUTE: &str = "<unknown>";

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metric `{0}` is already registered")]
    AlreadyRegistered(&'static str),

    #[error("failed to build prometheus recorder: {0}")]
    Build(#[from] BuildError),
}

/// Process metrics registry backed by a Prometheus recorder.
pub struct MetricsRegistry {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    registered: Mutex<HashSet<&'static str>>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self, MetricsError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(REQUEST_DURATION_MS.to_string()),
                &LATENCY_BUCKETS_MS,
            )?
            .build_recorder();
        let handle = recorder.handle();

        Ok(Self {
            recorder,
            handle,
            registered: Mutex::new(HashSet::new()),
        })
    }

    /// Claim metric names. Either all names are claimed or none are.
    pub fn register(&self, names: &[&'static str]) -> Result<(), MetricsError> {
        let mut registered = self.registered.lock().expect("metrics registry mutex poisoned");
        if let Some(name) = names.iter().find(|name| registered.contains(*name)) {
            return Err(MetricsError::AlreadyRegistered(*name));
        }
        registered.extend(names.iter().copied());
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registered
            .lock()
            .expect("metrics registry mutex poisoned")
            .contains(name)
    }

    /// Prometheus text exposition of everything recorded so far.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Run `f` with this registry as the active `metrics` recorder.
    pub fn with_recorder<T>(&self, f: impl FnOnce() -> T) -> T {
        metrics::with_local_recorder(&self.recorder, f)
    }
}

/// Request counter and latency histogram for the HTTP stack.
///
/// Cheap to clone; clones share the registry and route table.
#[derive(Clone)]
pub struct HttpMetrics {
    registry: Arc<MetricsRegistry>,
    routes: Arc<RouteTable>,
}

impl HttpMetrics {
    /// Register the HTTP metrics on `registry`.
    ///
    /// `routes` is the fallback used to label requests the router did not
    /// resolve a pattern for.
    pub fn new(registry: Arc<MetricsRegistry>, routes: RouteTable) -> Result<Self, MetricsError> {
        registry.register(&[REQUESTS_TOTAL, REQUEST_DURATION_MS])?;
        registry.with_recorder(|| {
            metrics::describe_counter!(
                REQUESTS_TOTAL,
                "how many http requests processed, partitioned by status code, method and path"
            );
            metrics::describe_histogram!(
                REQUEST_DURATION_MS,
                "how long it took to process the request, partitioned by status code, method and HTTP path"
            );
        });

        Ok(Self {
            registry,
            routes: Arc::new(routes),
        })
    }

    pub fn registry(&self) -> &Arc<MetricsRegistry> {
        &self.registry
    }

    pub fn record(&self, status: StatusCode, method: &Method, route: &str, elapsed: Duration) {
        let labels = [
            ("code", status.as_u16().to_string()),
            ("method", method.to_string()),
            ("path", route.to_owned()),
        ];
        let millis = elapsed.as_secs_f64() * 1000.0;

        self.registry.with_recorder(|| {
            metrics::counter!(REQUESTS_TOTAL, &labels).increment(1);
            metrics::histogram!(REQUEST_DURATION_MS, &labels).record(millis);
        });
    }

    /// Route pattern to label `request` with.
    ///
    /// The router's own match wins. Without one (the request was answered
    /// before routing, or the metrics layer sits outside the router) the path
    /// is matched again against the route table.
    pub fn route_pattern<B>(&self, request: &axum::http::Request<B>) -> String {
        if let Some(matched) = request.extensions().get::<MatchedPath>() {
            return matched.as_str().to_owned();
        }

        let path = request.uri().path();
        match self.routes.resolve(path) {
            Some(pattern) => pattern.to_owned(),
            None => {
                tracing::warn!(path, "unknown endpoint requested");
                UNKNOWN_ROUTE.to_owned()
            }
        }
    }
}

/// Middleware recording [`HttpMetrics`] for every request.
pub async fn track_metrics(
    State(metrics): State<HttpMetrics>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let route = metrics.route_pattern(&request);

    let response = next.run(request).await;

    metrics.record(response.status(), &method, &route, started.elapsed());
    response
}

/// Handler exposing the registry to Prometheus scrapers.
pub async fn render_metrics(State(registry): State<Arc<MetricsRegistry>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        registry.render(),
    )
}
