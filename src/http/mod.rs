//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum serve, peer address attached)
//!     → stack.rs (heartbeat, request id, real ip, logging, metrics, panics)
//!     → middleware/cache.rs (no-store on GET)
//!     → handler (request.rs context, encoding::StrictJson)
//!     → response.rs (JSON reply)
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;
pub mod stack;

pub use request::{RequestContext, RequestIdExt, X_REQUEST_ID};
pub use response::{reply_json, JsonReply, JSON_CONTENT_TYPE};
pub use server::HttpServer;
pub use stack::bind_standard_middleware;
