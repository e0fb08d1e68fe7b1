//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber (pretty or JSON output)
//! - Emit one structured record per HTTP request
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - The request record is written after the handler returns; panics are
//!   turned into 500s further down the stack, so every request is logged
//! - `request_id` is only present when an id was established upstream

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::HttpBody,
    extract::{ConnectInfo, Request},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

use crate::config::{LogFormat, ObservabilityConfig};
use crate::http::middleware::ClientAddr;
use crate::http::request::RequestIdExt;

/// Install the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.log_level)));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    }
}

/// Log status, sizes, duration and client of every request.
pub async fn request_logger(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = request.request_id().map(str::to_owned);
    let method = request.method().clone();
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    let req_size = content_length(request.headers())
        .or_else(|| request.body().size_hint().exact().map(|n| n as i64))
        .unwrap_or(-1);
    let remote_ip = client_addr(&request)
        .map(|addr| remote_ip(&addr))
        .unwrap_or_else(|| "unknown".to_string());

    let response = next.run(request).await;

    let hint = response.body().size_hint();
    let resp_size = hint.exact().unwrap_or(hint.lower());

    tracing::info!(
        status_code = response.status().as_u16(),
        req_size,
        resp_size,
        duration_ms = started.elapsed().as_millis() as u64,
        remote_ip = %remote_ip,
        method = %method,
        path = %path,
        request_id = request_id.as_deref(),
        "HTTP request"
    );

    response
}

fn content_length(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn client_addr(request: &Request) -> Option<String> {
    if let Some(addr) = request.extensions().get::<ClientAddr>() {
        return Some(addr.as_str().to_owned());
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(peer)| peer.to_string())
}

/// Host part of `addr`, or `addr` itself when it is not `host:port`.
fn remote_ip(addr: &str) -> String {
    match addr.parse::<SocketAddr>() {
        Ok(socket) => socket.ip().to_string(),
        Err(_) => addr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{HeaderValue, Request as HttpRequest, StatusCode},
        middleware,
        routing::post,
        Router,
    };
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    #[test]
    fn test_remote_ip_strips_port() {
        assert_eq!(remote_ip("192.0.2.1:8080"), "192.0.2.1");
        assert_eq!(remote_ip("[2001:db8::2]:443"), "2001:db8::2");
    }

    #[test]
    fn test_remote_ip_falls_back_to_raw() {
        assert_eq!(remote_ip("192.0.2.1"), "192.0.2.1");
        assert_eq!(remote_ip("garbage"), "garbage");
    }

    #[test]
    fn test_content_length() {
        let mut headers = HeaderMap::new();
        assert_eq!(content_length(&headers), None);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("42"));
        assert_eq!(content_length(&headers), Some(42));
    }

    #[test]
    fn test_client_addr_prefers_extension() {
        let mut request = HttpRequest::get("/").body(Body::empty()).unwrap();
        let peer: SocketAddr = "192.0.2.7:41000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(client_addr(&request).as_deref(), Some("192.0.2.7:41000"));

        request.extensions_mut().insert(ClientAddr("198.51.100.1".into()));
        assert_eq!(client_addr(&request).as_deref(), Some("198.51.100.1"));
    }

    #[tokio::test]
    async fn test_logger_passes_response_through() {
        let app = Router::new()
            .route("/items", post(|| async { (StatusCode::CREATED, "made") }))
            .layer(middleware::from_fn(request_logger));

        let response = app
            .oneshot(
                HttpRequest::post("/items?x=1")
                    .header("x-request-id", "req-7")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn request_records(&self) -> Vec<serde_json::Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap())
                .filter(|record| record["fields"]["message"] == "HTTP request")
                .map(|record| record["fields"].clone())
                .collect()
        }
    }

    /// Send `request` through the logger and return the emitted record.
    async fn logged_record(request: HttpRequest<Body>) -> serde_json::Value {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().json().with_writer(move || writer.clone()));
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = Router::new()
            .route("/items", post(|| async { (StatusCode::CREATED, "made") }))
            .layer(middleware::from_fn(request_logger));
        app.oneshot(request).await.unwrap();

        let mut records = logs.request_records();
        assert_eq!(records.len(), 1, "expected one request record");
        records.remove(0)
    }

    fn request_from_peer(request_id: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::post("/items?limit=5").header(header::CONTENT_LENGTH, "2");
        if let Some(id) = request_id {
            builder = builder.header("x-request-id", id);
        }
        let mut request = builder.body(Body::from("{}")).unwrap();
        let peer: SocketAddr = "192.0.2.7:41000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        request
    }

    #[tokio::test]
    async fn test_record_fields() {
        let record = logged_record(request_from_peer(Some("req-7"))).await;

        assert_eq!(record["status_code"], 201);
        assert_eq!(record["method"], "POST");
        assert_eq!(record["path"], "/items?limit=5");
        assert_eq!(record["remote_ip"], "192.0.2.7");
        assert_eq!(record["req_size"], 2);
        assert_eq!(record["resp_size"], 4);
        assert_eq!(record["request_id"], "req-7");
        assert!(record["duration_ms"].is_u64());
    }

    #[tokio::test]
    async fn test_record_omits_missing_request_id() {
        let record = logged_record(request_from_peer(None)).await;

        assert_eq!(record["status_code"], 201);
        assert!(record.get("request_id").is_none(), "record: {record}");
    }
}
