//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. CORS (browser front end on another origin)
//! 3. `TraceLayer` (request span with an empty `request_id` field)
//! 4. Request ID (fills the span field, tags Sentry, echoes the header)
//! 5. Rate limiting (governor, `/api/v1` only)

pub mod rate_limit;
pub mod request_id;

pub use rate_limit::api_rate_limiter;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
