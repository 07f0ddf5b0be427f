//! Admin API.
//!
//! `POST /api/admin/email/test` sends one test e-mail through the configured
//! [`Mailer`](crate::mail::Mailer):
//!
//! ```text
//! AUTH_CHECK ──no session──────────────▶ 401 AUTH_REQUIRED
//!     │       ──provider failure───────▶ 500 INTERNAL_ERROR
//!     ▼
//! ADMIN_CHECK ──not an admin───────────▶ 403 FORBIDDEN
//!     │
//!     ▼
//! VALIDATE ──bad body──────────────────▶ 400 INVALID_REQUEST
//!     │
//!     ▼
//! SEND ──transport failure─────────────▶ 500 INTERNAL_ERROR
//!     │
//!     ▼
//! 200 {"success": true, "messageId": …, "message": …}
//! ```

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use health_companion_core::Email;

use crate::error::{ApiError, ApiErrorCode, add_breadcrumb, log_api_error};
use crate::identity::IdentityError;
use crate::mail::{MailTemplate, TestEmail};
use crate::middleware::resolve_session;
use crate::state::AppState;

const ENDPOINT: &str = "/api/admin/email/test";

#[derive(Debug, Deserialize)]
struct TestEmailRequest {
    template: MailTemplate,
    email: String,
    #[serde(default)]
    data: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Body of an accepted test e-mail.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestEmailResponse {
    pub success: bool,
    pub message_id: String,
    pub message: String,
}

fn parse_request(body: &[u8]) -> Result<TestEmail, ApiError> {
    let request: TestEmailRequest = serde_json::from_slice(body).map_err(|e| {
        ApiError::invalid_request("Invalid request body", json!({ "reason": e.to_string() }))
    })?;
    let to = Email::parse(&request.email).map_err(|e| {
        ApiError::invalid_request(
            "Validation failed",
            json!({ "field": "email", "reason": e.to_string() }),
        )
    })?;
    Ok(TestEmail {
        template: request.template,
        to,
        data: request.data.unwrap_or_default(),
    })
}

/// Send a test e-mail on behalf of an admin.
pub async fn send_test_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let session = match resolve_session(&state, &headers).await {
        Ok(Some(session)) => session,
        Ok(None) | Err(IdentityError::MalformedCredential) => {
            return ApiError::unauthorized().into_response();
        }
        Err(e) => {
            log_api_error(&e, ENDPOINT, "POST", ApiErrorCode::InternalError);
            return ApiError::internal().into_response();
        }
    };

    if !state.is_admin(Some(&session.user)) {
        tracing::warn!(user_id = %session.user.id, "Non-admin attempted to send a test e-mail");
        return ApiError::forbidden("Admin access required").into_response();
    }

    let email = match parse_request(&body) {
        Ok(email) => email,
        Err(e) => return e.into_response(),
    };

    add_breadcrumb(
        "admin",
        "Sending test e-mail",
        Some(&[("template", email.template.as_str())][..]),
    );

    match state.mailer().send_test(&email).await {
        Ok(message_id) => Json(TestEmailResponse {
            success: true,
            message_id,
            message: format!("Test email would be sent to {} in production", email.to),
        })
        .into_response(),
        Err(e) => {
            log_api_error(&e, ENDPOINT, "POST", ApiErrorCode::InternalError);
            ApiError::internal_with("Failed to send test email").into_response()
        }
    }
}
