//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Ctrl-C or Shutdown::trigger()
//!     → shutdown.rs (broadcast to every subscriber)
//!     → HttpServer stops accepting, drains in-flight requests, returns
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
