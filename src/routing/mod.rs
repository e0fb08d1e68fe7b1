//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at startup):
//!     ServiceRouter::route(pattern, handler)
//!     → axum::Router (dispatch)
//!     → RouteTable (pattern index for metrics)
//!
//! Metrics labelling (per request):
//!     MatchedPath from axum, else RouteTable::resolve(raw path)
//! ```
//!
//! # Design Decisions
//! - Patterns are recorded once, immutable afterwards
//! - The route table uses the same `{param}` syntax as axum

pub mod router;

pub use router::{RouteError, RouteTable, ServiceRouter};
