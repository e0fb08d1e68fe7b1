//! Cache-Control defaults for GET responses.

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
};

/// Mark GET responses `Cache-Control: no-store` unless the handler chose a
/// value itself.
pub async fn disable_cache_on_get_requests(request: Request, next: Next) -> Response {
    let is_get = request.method() == Method::GET;
    let mut response = next.run(request).await;

    if is_get {
        response
            .headers_mut()
            .entry(header::CACHE_CONTROL)
            .or_insert(HeaderValue::from_static("no-store"));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        response::IntoResponse,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/plain", get(|| async { "ok" }).post(|| async { "created" }))
            .route(
                "/cached",
                get(|| async {
                    ([(header::CACHE_CONTROL, "max-age=60")], "ok").into_response()
                }),
            )
            .layer(middleware::from_fn(disable_cache_on_get_requests))
    }

    async fn send(method: Method, uri: &str) -> Response {
        app()
            .oneshot(
                HttpRequest::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_defaults_to_no_store() {
        let response = send(Method::GET, "/plain").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[tokio::test]
    async fn test_handler_value_wins() {
        let response = send(Method::GET, "/cached").await;
        assert_eq!(response.headers()[header::CACHE_CONTROL], "max-age=60");
    }

    #[tokio::test]
    async fn test_other_methods_untouched() {
        let response = send(Method::POST, "/plain").await;
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    }
}
