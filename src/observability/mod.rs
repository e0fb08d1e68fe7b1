//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request passing the standard stack produces:
//!     → logging.rs (one structured "HTTP request" record)
//!     → metrics.rs (request counter + latency histogram)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows into every log record that has one
//! - Metrics live in an explicitly constructed registry, not a global

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, request_logger};
pub use metrics::{track_metrics, HttpMetrics, MetricsError, MetricsRegistry};
