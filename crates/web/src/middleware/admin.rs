//! Admin guard for the `/admin` subtree.
//!
//! Runs before any admin handler. Admin layouts and pages render
//! unconditionally because nothing reaches them without passing here.
//!
//! | Caller          | Outcome                                        |
//! |-----------------|------------------------------------------------|
//! | anonymous       | redirect to `{prefix}/sign-in`                 |
//! | signed in       | redirect to `{prefix}/dashboard?error=access_denied` |
//! | admin           | request continues with the session attached    |

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::error::AppError;
use crate::identity::IdentityError;
use crate::middleware::auth::resolve_session;
use crate::middleware::locale::ResolvedLocale;
use crate::state::AppState;

/// Query marker the root shell turns into an access-denied toast.
pub const ACCESS_DENIED_QUERY: &str = "error=access_denied";

/// Reject everyone but admins.
pub async fn admin_guard(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let locale = request
        .extensions()
        .get::<ResolvedLocale>()
        .map_or(health_companion_core::Locale::DEFAULT, |r| r.locale);

    let session = match resolve_session(&state, request.headers()).await {
        Ok(session) => session,
        Err(IdentityError::MalformedCredential) => None,
        Err(e) => return AppError::from(e).into_response(),
    };

    let Some(session) = session else {
        return Redirect::to(&locale.href("/sign-in")).into_response();
    };

    if !state.is_admin(Some(&session.user)) {
        tracing::warn!(
            user_id = %session.user.id,
            path = %request.uri().path(),
            "Admin access denied"
        );
        let target = format!("{}?{ACCESS_DENIED_QUERY}", locale.href("/dashboard"));
        return Redirect::to(&target).into_response();
    }

    crate::error::set_sentry_user(&session.user.id);
    request.extensions_mut().insert(session);
    next.run(request).await
}
