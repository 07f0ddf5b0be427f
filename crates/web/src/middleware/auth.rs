//! Session resolution and authentication extractors.
//!
//! The session lives entirely at the identity provider. A request carries
//! only the access-token cookie; every extractor asks the provider who owns
//! it. Absence of a session is `None`, never an error.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::error::{ApiError, AppError};
use crate::identity::{ACCESS_TOKEN_COOKIE, AccessToken, AuthUser, IdentityError};
use crate::middleware::locale::ResolvedLocale;
use crate::state::AppState;

/// A live session: the provider's user record and the token that proves it.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: AuthUser,
    pub token: AccessToken,
}

/// Resolve the session carried by the request's cookies.
///
/// # Errors
///
/// Returns `IdentityError::MalformedCredential` for a cookie that is not a
/// token, and transport/provider errors as-is.
pub async fn resolve_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<Session>, IdentityError> {
    let jar = CookieJar::from_headers(headers);
    let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) else {
        return Ok(None);
    };

    let token = AccessToken::parse(cookie.value())?;
    let user = state.identity().get_user(&token).await?;
    Ok(user.map(|user| Session { user, token }))
}

/// Resolve the session, reusing one the admin guard already resolved.
async fn session_from_parts(
    parts: &Parts,
    state: &AppState,
) -> Result<Option<Session>, IdentityError> {
    if let Some(session) = parts.extensions.get::<Session>() {
        return Ok(Some(session.clone()));
    }
    resolve_session(state, &parts.headers).await
}

/// Extractor for pages that personalize when signed in.
///
/// Never rejects: a malformed cookie or an unreachable provider both read as
/// anonymous, so public pages always render.
pub struct OptionalUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match session_from_parts(parts, state).await {
            Ok(session) => Ok(Self(session.map(|s| s.user))),
            Err(IdentityError::MalformedCredential) => {
                tracing::warn!("Ignoring malformed session cookie");
                Ok(Self(None))
            }
            Err(e) => {
                let event_id = sentry::capture_error(&e);
                tracing::warn!(
                    error = %e,
                    sentry_event_id = %event_id,
                    "Session lookup failed, rendering anonymously"
                );
                Ok(Self(None))
            }
        }
    }
}

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(session): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", session.user.greeting_name())
/// }
/// ```
pub struct RequireUser(pub Session);

/// Error returned when a route requires a session and there is none.
pub enum AuthRejection {
    /// Redirect to the sign-in page of the request locale (HTML requests).
    RedirectToSignIn(String),
    /// JSON 401 (API requests).
    Unauthorized,
    /// The provider could not be asked.
    Failed(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToSignIn(location) => Redirect::to(&location).into_response(),
            Self::Unauthorized => ApiError::unauthorized().into_response(),
            Self::Failed(e) => e.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let is_api = parts.uri.path().starts_with("/api/");

        let session = match session_from_parts(parts, state).await {
            Ok(session) => session,
            Err(IdentityError::MalformedCredential) => None,
            Err(e) => return Err(AuthRejection::Failed(e.into())),
        };

        match session {
            Some(session) => {
                crate::error::set_sentry_user(&session.user.id);
                Ok(Self(session))
            }
            None if is_api => Err(AuthRejection::Unauthorized),
            None => {
                let Ok(locale) = ResolvedLocale::from_request_parts(parts, state).await;
                Err(AuthRejection::RedirectToSignIn(locale.href("/sign-in")))
            }
        }
    }
}

/// Session cookie holding `token`.
///
/// Lives for the browser session; the provider decides when the token itself
/// stops being accepted.
#[must_use]
pub fn session_cookie(token: &AccessToken, secure: bool) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, token.expose().to_owned()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Cookie that clears the session cookie.
#[must_use]
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(ACCESS_TOKEN_COOKIE).path("/").build()
}
