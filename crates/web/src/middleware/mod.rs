//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with `request_id` and `locale` fields)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame and referrer policy)
//! 5. Locale resolution (page routes only, before routing)
//! 6. Localized error pages (page routes only)
//! 7. Admin guard (`/admin` subtree only)

pub mod admin;
pub mod auth;
pub mod error_page;
pub mod locale;
pub mod request_id;
pub mod security_headers;

pub use admin::{ACCESS_DENIED_QUERY, admin_guard};
pub use auth::{
    AuthRejection, OptionalUser, RequireUser, Session, removal_cookie, resolve_session,
    session_cookie,
};
pub use error_page::error_page_middleware;
pub use locale::{ResolvedLocale, locale_middleware};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
