//! HTTP route handlers.
//!
//! # Route Structure
//!
//! Page routes accept an optional locale prefix (`/fr/...`); the locale
//! middleware strips it before these tables are consulted.
//!
//! ```text
//! GET    /                    - Landing page
//! GET    /sign-in             - Sign-in form
//! POST   /sign-in             - Sign-in action
//! GET    /sign-out            - Sign-out action
//!
//! # Signed in
//! GET    /dashboard           - Dashboard
//! GET    /chat                - Chat
//!
//! # Admin (behind admin_guard)
//! GET    /admin               - Admin overview
//! GET    /admin/email         - E-mail testing
//!
//! # API (never localized)
//! DELETE /api/profile/delete  - Delete the caller's account
//! POST   /api/admin/email/test - Send a test e-mail (admins only)
//! ```

pub mod admin;
pub mod api;
pub mod auth;
pub mod dashboard;
pub mod errors;
pub mod landing;

use axum::{
    Router,
    http::Uri,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};

use crate::error::AppError;
use crate::middleware::{admin_guard, error_page_middleware};
use crate::state::AppState;

/// Create the admin routes router, gated by the admin guard.
pub fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::overview))
        .route("/admin/email", get(admin::email))
        .route_layer(from_fn_with_state(state, admin_guard))
}

/// Create the localized page routes.
///
/// Error responses from any of them, the fallback included, are replaced by
/// a localized error page.
pub fn page_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(landing::landing))
        .route("/sign-in", get(auth::sign_in_page).post(auth::sign_in))
        .route("/sign-out", get(auth::sign_out))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/chat", get(dashboard::chat))
        .merge(admin_routes(state.clone()))
        .fallback(not_found)
        .layer(from_fn_with_state(state, error_page_middleware))
}

/// Create the JSON API routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/profile/delete", delete(api::profile::delete_account))
        .route("/api/admin/email/test", post(api::admin::send_test_email))
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
