//! Small request/response middlewares used by the standard stack.

pub mod cache;
pub mod heartbeat;
pub mod real_ip;
pub mod recover;

pub use cache::disable_cache_on_get_requests;
pub use heartbeat::{heartbeat, DEFAULT_HEALTH_PATH};
pub use real_ip::{real_ip, ClientAddr};
pub use recover::recover_from_panic;
