//! Admin section pages.
//!
//! Mounted behind [`admin_guard`](crate::middleware::admin_guard); handlers
//! here perform no authorization of their own.

use askama::Template;
use axum::extract::State;

use crate::error::Result;
use crate::layout::{self, Document, LayoutChain, Markup, PageMeta, RenderContext, RenderError};
use crate::mail::MailTemplate;
use crate::middleware::ResolvedLocale;
use crate::state::AppState;

const TEST_EMAIL_ENDPOINT: &str = "/api/admin/email/test";

#[derive(Template)]
#[template(path = "pages/admin.html")]
struct OverviewTemplate {
    title: String,
    description: String,
    email_href: String,
    email_label: String,
}

struct TemplateOption {
    value: &'static str,
    label: String,
}

struct TestEmailForm {
    template_label: String,
    templates: Vec<TemplateOption>,
    email_label: String,
    email_placeholder: String,
    data_label: String,
    data_placeholder: String,
    send_button: String,
    sending_button: String,
    success_message: String,
    invalid_json: String,
    error_title: String,
}

#[derive(Template)]
#[template(path = "pages/admin_email.html")]
struct EmailTemplate {
    title: String,
    description: String,
    test_email: String,
    test_email_description: String,
    endpoint: &'static str,
    form: TestEmailForm,
}

/// Render the admin overview document.
///
/// # Errors
///
/// Returns an error if translations are missing.
pub fn render_overview(ctx: &RenderContext<'_>) -> std::result::Result<Document, RenderError> {
    let t = ctx.bundle("Admin")?;
    let meta = PageMeta::from_bundle(&t)?;
    let body = Markup::render(&OverviewTemplate {
        title: t.text("title")?,
        description: t.text("description")?,
        email_href: ctx.href("/admin/email"),
        email_label: t.text("nav_email")?,
    })?;
    layout::compose(LayoutChain::ADMIN, ctx, meta, body)
}

/// Render the admin e-mail testing document.
///
/// # Errors
///
/// Returns an error if translations are missing.
pub fn render_email(ctx: &RenderContext<'_>) -> std::result::Result<Document, RenderError> {
    let t = ctx.bundle("Admin.Email")?;
    let meta = PageMeta::from_bundle(&t)?;
    let body = Markup::render(&EmailTemplate {
        title: t.text("title")?,
        description: t.text("description")?,
        test_email: t.text("testEmail")?,
        test_email_description: t.text("testEmailDescription")?,
        endpoint: TEST_EMAIL_ENDPOINT,
        form: TestEmailForm {
            template_label: t.text("templateLabel")?,
            templates: [
                (MailTemplate::Welcome, "templates.welcome"),
                (MailTemplate::PasswordReset, "templates.passwordReset"),
                (MailTemplate::VerifyEmail, "templates.verifyEmail"),
            ]
            .into_iter()
            .map(|(template, key)| -> std::result::Result<TemplateOption, RenderError> {
                Ok(TemplateOption {
                    value: template.as_str(),
                    label: t.text(key)?,
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?,
            email_label: t.text("emailLabel")?,
            email_placeholder: t.text("emailPlaceholder")?,
            data_label: t.text("dataLabel")?,
            data_placeholder: t.text("dataPlaceholder")?,
            send_button: t.text("sendButton")?,
            sending_button: t.text("sendingButton")?,
            success_message: t.text("successMessage")?,
            invalid_json: t.text("invalidJson")?,
            error_title: t.text("errorTitle")?,
        },
    })?;
    layout::compose(LayoutChain::ADMIN, ctx, meta, body)
}

/// Display the admin overview.
pub async fn overview(State(state): State<AppState>, locale: ResolvedLocale) -> Result<Document> {
    let ctx = RenderContext::new(locale.locale, &locale.path, state.catalog());
    Ok(render_overview(&ctx)?)
}

/// Display the admin e-mail testing page.
pub async fn email(State(state): State<AppState>, locale: ResolvedLocale) -> Result<Document> {
    let ctx = RenderContext::new(locale.locale, &locale.path, state.catalog());
    Ok(render_email(&ctx)?)
}
