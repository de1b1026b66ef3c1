#![allow(clippy::module_inception)]
pub mod cors;
pub mod limits;
pub mod middleware;
pub mod panic_recovery;
pub mod request_id;
pub mod trace;

pub use cors::{AllowedOrigins, CorsConfig, CorsMiddleware};
pub use limits::{LimitsConfig, LimitsMiddleware};
pub use middleware::{Middleware, compose};
pub use panic_recovery::PanicRecoveryMiddleware;
pub use request_id::RequestId;
pub use trace::TracingMiddleware;
