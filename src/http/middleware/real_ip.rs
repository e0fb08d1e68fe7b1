//! Client address resolution.
//!
//! # Responsibilities
//! - Pick the client IP from proxy headers when present
//! - Fall back to the peer address of the connection
//! - Expose the result as a [`ClientAddr`] request extension
//!
//! # Design Decisions
//! - Header precedence: `True-Client-IP`, `X-Real-IP`, then the first
//!   `X-Forwarded-For` hop
//! - Header values that are not IP addresses are ignored
//! - Only run this behind a proxy that overwrites these headers

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

const TRUE_CLIENT_IP: &str = "true-client-ip";
const X_REAL_IP: &str = "x-real-ip";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Address of the client that issued the request.
///
/// Either a bare IP (taken from a proxy header) or `ip:port` (the peer
/// address of the connection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientAddr(pub String);

impl ClientAddr {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Attach a [`ClientAddr`] to the request.
pub async fn real_ip(mut request: Request, next: Next) -> Response {
    let addr = forwarded_ip(request.headers())
        .map(|ip| ip.to_string())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(peer)| peer.to_string())
        });

    if let Some(addr) = addr {
        request.extensions_mut().insert(ClientAddr(addr));
    }
    next.run(request).await
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let candidate = header(TRUE_CLIENT_IP)
        .or_else(|| header(X_REAL_IP))
        .or_else(|| header(X_FORWARDED_FOR).and_then(|list| list.split(',').next()))?;
    candidate.trim().parse().ok()
}
