//! Profile API.
//!
//! `DELETE /api/profile/delete` removes the caller's account:
//!
//! ```text
//! AUTH_CHECK ──no session──────────────▶ 401 AUTH_REQUIRED
//!     │
//!     ▼
//! DELETE_ATTEMPT ──provider failure────▶ 500 DB_ERROR
//!     │           ──no service key─────▶ 503 SERVICE_UNAVAILABLE
//!     ▼
//! SIGN_OUT (best effort) ──────────────▶ 200 {"success": true}
//! ```
//!
//! Any other failure answers 500 `INTERNAL_ERROR`. The session dies with the
//! account, so a repeated call fails AUTH_CHECK with 401.

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;

use crate::error::{ApiError, ApiErrorCode, add_breadcrumb, log_api_error};
use crate::identity::{AuthEvent, IdentityError};
use crate::middleware::{removal_cookie, resolve_session};
use crate::state::AppState;

const ENDPOINT: &str = "/api/profile/delete";

/// Body of a successful deletion.
#[derive(Debug, Serialize)]
pub struct DeleteAccountResponse {
    pub success: bool,
}

/// Delete the signed-in user's account.
pub async fn delete_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    let session = match resolve_session(&state, &headers).await {
        Ok(Some(session)) => session,
        Ok(None) | Err(IdentityError::MalformedCredential) => {
            return ApiError::unauthorized().into_response();
        }
        Err(e) => {
            log_api_error(&e, ENDPOINT, "DELETE", ApiErrorCode::InternalError);
            return ApiError::internal().into_response();
        }
    };

    let user_id = session.user.id;
    let user_id_str = user_id.to_string();
    add_breadcrumb(
        "account",
        "Deleting account",
        Some(&[("user_id", user_id_str.as_str())][..]),
    );

    match state.identity().delete_user(&user_id).await {
        Ok(()) => {}
        Err(IdentityError::AdminUnavailable) => {
            tracing::error!("Account deletion requested but the service-role key is not configured");
            return ApiError::service_unavailable("Account deletion is not available").into_response();
        }
        Err(e) => {
            log_api_error(&e, ENDPOINT, "DELETE", ApiErrorCode::DbError);
            return ApiError::db_error("Failed to delete account").into_response();
        }
    }

    tracing::info!(user_id = %user_id, "Account deleted");

    if let Err(e) = state.identity().sign_out(&session.token).await {
        tracing::warn!(user_id = %user_id, error = %e, "Sign-out after account deletion failed");
    }

    state.auth_events().publish(AuthEvent::AccountDeleted(user_id));

    (
        jar.remove(removal_cookie()),
        Json(DeleteAccountResponse { success: true }),
    )
        .into_response()
}
