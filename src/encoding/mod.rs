//! Request body decoding.
//!
//! # Data Flow
//! ```text
//! Request (headers + body)
//!     → json.rs (content-type check, bounded read, strict decode)
//!     → error.rs (DecodeError taxonomy → BadRequestError)
//!     → handler writes the error or uses the decoded value
//! ```
//!
//! # Design Decisions
//! - Client input errors carry a precise status and message
//! - Unexpected failures are logged and surface as a bare 500
//! - The body is read fully (bounded) before parsing

pub mod error;
pub mod json;

pub use error::{BadRequestError, DecodeError};
pub use json::{decode_json, StrictJson, MAX_BODY_BYTES};
