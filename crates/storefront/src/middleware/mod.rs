//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, `PostgreSQL` or in-memory store)
//! 5. Security headers (CSP, frame and referrer policy)
//! 6. Rate limiting on the contact form (governor)
//!
//! `tracker_owner` is an extractor rather than a layer: it scopes tracker
//! handlers to the visitor's session.

pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod tracker_owner;

pub use rate_limit::contact_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
