//! Unified error handling with Sentry integration.
//!
//! Two response shapes exist:
//!
//! - [`AppError`] for HTML routes: server errors are captured to Sentry and
//!   logged, then answered with a short generic message. The response is
//!   tagged with an [`ErrorPage`] so page routes can swap in a localized
//!   document.
//! - [`ApiError`] for JSON routes: `{ "error": …, "code": …, "details"? }`
//!   with a machine-readable [`ApiErrorCode`].
//!
//! Neither ever echoes provider bodies, template errors, or other internal
//! detail to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::identity::IdentityError;
use crate::layout::RenderError;

/// Application-level error type for HTML routes.
#[derive(Debug, Error)]
pub enum AppError {
    /// Identity provider operation failed.
    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),

    /// Page could not be rendered (missing translations, template failure).
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Which error page a failed HTML response should show.
///
/// Carried as a response extension; the message keys live in the `Errors`
/// translation namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPage {
    NotFound,
    Unavailable,
    Internal,
}

impl ErrorPage {
    /// Key of the page's message group in the `Errors` namespace.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::NotFound => "notFound",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        }
    }
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        matches!(self, Self::Identity(_) | Self::Render(_))
    }

    const fn page(&self) -> ErrorPage {
        match self {
            Self::Identity(IdentityError::AdminUnavailable) => ErrorPage::Unavailable,
            Self::Identity(_) | Self::Render(_) => ErrorPage::Internal,
            Self::NotFound(_) => ErrorPage::NotFound,
        }
    }

    const fn status(&self) -> StatusCode {
        match self.page() {
            ErrorPage::NotFound => StatusCode::NOT_FOUND,
            ErrorPage::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorPage::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let page = self.page();

        // Don't expose internal error details to clients
        let message = match page {
            ErrorPage::NotFound => "Not found",
            ErrorPage::Unavailable => "Service temporarily unavailable",
            ErrorPage::Internal => "Internal server error",
        };

        let mut response = (self.status(), message).into_response();
        response.extensions_mut().insert(page);
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

// =============================================================================
// JSON API errors
// =============================================================================

/// Machine-readable error codes shared by every JSON endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    /// Caller is not authenticated.
    AuthRequired,
    /// Caller is authenticated but lacks permission.
    Forbidden,
    /// Request is malformed.
    InvalidRequest,
    /// Persistent-state operation at the provider failed.
    DbError,
    /// Unexpected server error.
    InternalError,
    /// A required service is not configured.
    ServiceUnavailable,
}

/// JSON body of an API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorBody {
    /// Human-readable message.
    pub error: String,
    /// Machine-readable code.
    pub code: ApiErrorCode,
    /// Optional extra context (validation failures).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// An API error response: status plus [`ApiErrorBody`].
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    body: ApiErrorBody,
}

impl ApiError {
    /// Build an error response.
    #[must_use]
    pub fn new(status: StatusCode, code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorBody {
                error: message.into(),
                code,
                details: None,
            },
        }
    }

    /// Attach details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.body.details = Some(details);
        self
    }

    /// 401: missing or invalid session.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ApiErrorCode::AuthRequired, "Unauthorized")
    }

    /// 403: authenticated but not permitted.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, ApiErrorCode::Forbidden, message)
    }

    /// 400: the body failed validation; `details` says why.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorCode::InvalidRequest, message)
            .with_details(details)
    }

    /// 500 for a failed provider-side write.
    #[must_use]
    pub fn db_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorCode::DbError, message)
    }

    /// 500 fallback for unexpected failures.
    #[must_use]
    pub fn internal() -> Self {
        Self::internal_with("Internal server error")
    }

    /// 500 with a caller-chosen message.
    #[must_use]
    pub fn internal_with(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorCode::InternalError, message)
    }

    /// 503: a required service is not configured.
    #[must_use]
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::ServiceUnavailable,
            message,
        )
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code of the response.
    #[must_use]
    pub const fn code(&self) -> ApiErrorCode {
        self.body.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Log an API failure with request context and capture it to Sentry.
pub fn log_api_error(error: &dyn std::error::Error, endpoint: &str, method: &str, code: ApiErrorCode) {
    let event_id = sentry::capture_error(error);
    tracing::error!(
        error = %error,
        endpoint,
        method,
        code = ?code,
        sentry_event_id = %event_id,
        "API request failed"
    );
}

// =============================================================================
// Sentry context
// =============================================================================

/// Set the Sentry user context for the current scope.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::I18nError;
    use health_companion_core::Locale;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("/nowhere".to_string());
        assert_eq!(err.to_string(), "Not found: /nowhere");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            status_of(AppError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Identity(IdentityError::MalformedCredential)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::Identity(IdentityError::AdminUnavailable)),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_forbidden_keeps_message() {
        let err = ApiError::forbidden("Admin access required");
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.code(), ApiErrorCode::Forbidden);
        assert_eq!(err.body.error, "Admin access required");
    }

    #[test]
    fn test_app_error_tags_error_page() {
        let response = AppError::NotFound("/nowhere".to_string()).into_response();
        assert_eq!(response.extensions().get::<ErrorPage>(), Some(&ErrorPage::NotFound));

        let response = AppError::Identity(IdentityError::AdminUnavailable).into_response();
        assert_eq!(response.extensions().get::<ErrorPage>(), Some(&ErrorPage::Unavailable));
    }

    #[test]
    fn test_missing_namespace_blocks_render() {
        let err = AppError::Render(RenderError::I18n(I18nError::MissingNamespace {
            locale: Locale::Fr,
            namespace: "Index".to_string(),
        }));
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_api_error_body_shape() {
        let body = serde_json::to_value(&ApiError::unauthorized().body).unwrap_or_default();
        assert_eq!(
            body,
            serde_json::json!({ "error": "Unauthorized", "code": "AUTH_REQUIRED" })
        );
    }

    #[test]
    fn test_api_error_details_are_optional() {
        let err = ApiError::invalid_request("bad", serde_json::json!({ "field": "email" }));
        let body = serde_json::to_value(&err.body).unwrap_or_default();
        assert_eq!(body["details"]["field"], "email");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), ApiErrorCode::InvalidRequest);
    }
}
