//! HTTP service helpers.
//!
//! Building blocks shared by JSON-over-HTTP services: a strict request body
//! decoder, a JSON reply writer, request metrics labelled by route pattern,
//! per-request logging, and a standard middleware stack.
//!
//! # Architecture Overview
//!
//! ```text
//!     request ──▶ heartbeat ─▶ request id ─▶ real ip ─▶ logger ─▶ metrics ─▶ catch panic
//!                                                                               │
//!                                                                               ▼
//!     response ◀──────────────────────────────────────────────── handler (ServiceRouter)
//!                                                                  │            │
//!                                                  encoding::StrictJson   http::reply_json
//! ```
//!
//! `config` and `lifecycle` carry the service settings and the shutdown
//! signal; `routing` keeps the route table the metrics fall back to.

pub mod config;
pub mod encoding;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::ServiceConfig;
pub use encoding::{decode_json, BadRequestError, DecodeError, StrictJson};
pub use http::{reply_json, HttpServer, JsonReply, RequestContext};
pub use lifecycle::Shutdown;
pub use observability::MetricsRegistry;
pub use routing::ServiceRouter;
