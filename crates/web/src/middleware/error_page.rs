//! Localized error pages for the page routes.
//!
//! [`AppError`](crate::error::AppError) answers with a plain generic message
//! tagged with an [`ErrorPage`]. On page routes this middleware replaces
//! that body with a document in the request's locale, keeping the status.
//! If the error page itself fails to render, the plain response goes out.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ErrorPage;
use crate::layout::RenderContext;
use crate::middleware::locale::ResolvedLocale;
use crate::routes::errors;
use crate::state::AppState;

/// Replace tagged error responses with a localized error page.
pub async fn error_page_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let locale = request.extensions().get::<ResolvedLocale>().cloned();
    let response = next.run(request).await;

    let (Some(page), Some(locale)) = (response.extensions().get::<ErrorPage>().copied(), locale)
    else {
        return response;
    };

    let ctx = RenderContext::new(locale.locale, &locale.path, state.catalog());
    match errors::render(&ctx, page) {
        Ok(document) => (response.status(), document).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to render localized error page");
            response
        }
    }
}
