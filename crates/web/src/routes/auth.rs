//! Sign-in and sign-out.
//!
//! Password sign-in is delegated to the identity provider; on success the
//! provider's access token becomes the session cookie.

use askama::Template;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use secrecy::SecretString;
use serde::Deserialize;

use health_companion_core::Email;

use crate::error::{Result, add_breadcrumb};
use crate::identity::{AuthEvent, IdentityError};
use crate::layout::{self, Document, LayoutChain, Markup, PageMeta, RenderContext, RenderError};
use crate::middleware::{OptionalUser, ResolvedLocale, removal_cookie, resolve_session, session_cookie};
use crate::state::AppState;

/// Sign-in form data.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

#[derive(Template)]
#[template(path = "pages/sign_in.html")]
struct SignInTemplate {
    action: String,
    title: String,
    description: String,
    email_label: String,
    password_label: String,
    submit: String,
    email: String,
    error: Option<String>,
}

/// Render the sign-in page, optionally with the message under `error_key`.
fn render(
    ctx: &RenderContext<'_>,
    email: String,
    error_key: Option<&str>,
) -> std::result::Result<Document, RenderError> {
    let t = ctx.bundle("SignIn")?;
    let meta = PageMeta::from_bundle(&t)?;
    let error = error_key.map(|key| t.text(key)).transpose()?;

    let body = Markup::render(&SignInTemplate {
        action: ctx.href("/sign-in"),
        title: t.text("title")?,
        description: t.text("description")?,
        email_label: t.text("email_label")?,
        password_label: t.text("password_label")?,
        submit: t.text("submit")?,
        email,
        error,
    })?;

    layout::compose(LayoutChain::SIGN_IN, ctx, meta, body)
}

/// Display the sign-in form, or skip it when already signed in.
pub async fn sign_in_page(
    State(state): State<AppState>,
    locale: ResolvedLocale,
    OptionalUser(user): OptionalUser,
) -> Result<Response> {
    if user.is_some() {
        return Ok(Redirect::to(&locale.href("/dashboard")).into_response());
    }

    let ctx = RenderContext::new(locale.locale, &locale.path, state.catalog());
    Ok(render(&ctx, String::new(), None)?.into_response())
}

/// Handle sign-in form submission.
pub async fn sign_in(
    State(state): State<AppState>,
    locale: ResolvedLocale,
    jar: CookieJar,
    Form(form): Form<SignInForm>,
) -> Result<Response> {
    let ctx = RenderContext::new(locale.locale, &locale.path, state.catalog());

    let Ok(email) = Email::parse(&form.email) else {
        let page = render(&ctx, form.email, Some("invalid_email"))?;
        return Ok((StatusCode::BAD_REQUEST, page).into_response());
    };

    let password = SecretString::from(form.password);
    let Some(signed_in) = state
        .identity()
        .sign_in_with_password(&email, &password)
        .await?
    else {
        tracing::info!("Sign-in rejected by identity provider");
        let page = render(&ctx, email.to_string(), Some("invalid_credentials"))?;
        return Ok((StatusCode::UNAUTHORIZED, page).into_response());
    };

    add_breadcrumb("auth", "Signed in", None);
    state
        .auth_events()
        .publish(AuthEvent::SignedIn(signed_in.user.id));

    let jar = jar.add(session_cookie(
        &signed_in.access_token,
        state.config().secure_cookies(),
    ));
    Ok((jar, Redirect::to(&locale.href("/dashboard"))).into_response())
}

/// Revoke the session (best effort), clear the cookie, and go home.
pub async fn sign_out(
    State(state): State<AppState>,
    locale: ResolvedLocale,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    match resolve_session(&state, &headers).await {
        Ok(Some(session)) => {
            if let Err(e) = state.identity().sign_out(&session.token).await {
                tracing::warn!(error = %e, "Failed to revoke session at identity provider");
            }
            state
                .auth_events()
                .publish(AuthEvent::SignedOut(session.user.id));
        }
        Ok(None) | Err(IdentityError::MalformedCredential) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to resolve session during sign-out"),
    }

    (jar.remove(removal_cookie()), Redirect::to(&locale.href("/"))).into_response()
}
