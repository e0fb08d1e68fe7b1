//! Request metadata helpers.
//!
//! # Responsibilities
//! - Name the request id header shared by the request-id layers
//! - Read the request id back out of headers, requests and request parts
//! - Offer an extractor so handlers can tag their own logs
//!
//! # Design Decisions
//! - The id is assigned (or accepted from the client) by tower-http's
//!   request-id layers; this module only reads it
//! - An empty header counts as "no request id"

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderName, Request},
};

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Access to the request id established upstream.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl RequestIdExt for HeaderMap {
    fn request_id(&self) -> Option<&str> {
        self.get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .filter(|id| !id.is_empty())
    }
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.headers().request_id()
    }
}

impl RequestIdExt for Parts {
    fn request_id(&self) -> Option<&str> {
        self.headers.request_id()
    }
}

/// Per-request context available to handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: Option<String>,
}

impl RequestContext {
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            request_id: parts.request_id().map(str::to_owned),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_request_id_from_header() {
        let req = Request::builder()
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(req.request_id(), Some("abc-123"));
    }

    #[test]
    fn test_missing_or_empty_request_id() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(req.request_id(), None);

        let req = Request::builder()
            .header("x-request-id", "")
            .body(Body::empty())
            .unwrap();
        assert_eq!(req.request_id(), None);
    }

    #[tokio::test]
    async fn test_request_context_extractor() {
        let (mut parts, _) = Request::builder()
            .header("x-request-id", "req-9")
            .body(())
            .unwrap()
            .into_parts();
        let ctx = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ctx.request_id(), Some("req-9"));
    }
}
