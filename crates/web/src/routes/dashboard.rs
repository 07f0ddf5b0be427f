//! Signed-in dashboard and chat pages.

use askama::Template;
use axum::extract::{Query, State};
use serde::Deserialize;

use crate::error::Result;
use crate::layout::{self, Document, LayoutChain, Markup, PageMeta, RenderContext, RenderError};
use crate::middleware::{RequireUser, ResolvedLocale};
use crate::state::AppState;

/// Value of the `error` query parameter set by the admin guard.
const ACCESS_DENIED: &str = "access_denied";

/// Query parameters carrying one-shot notices.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub error: Option<String>,
}

impl NoticeQuery {
    fn access_denied(&self) -> bool {
        self.error.as_deref() == Some(ACCESS_DENIED)
    }
}

#[derive(Template)]
#[template(path = "pages/dashboard.html")]
struct DashboardTemplate {
    welcome: String,
    description: String,
    chat_title: String,
    chat_description: String,
    chat_button: String,
    chat_href: String,
    account_title: String,
    account_description: String,
    delete_button: String,
    delete_confirm: String,
    delete_failed: String,
    home_href: String,
}

#[derive(Template)]
#[template(path = "pages/chat.html")]
struct ChatTemplate {
    title: String,
    empty_title: String,
    empty_description: String,
    placeholder: String,
    send: String,
}

/// Render the dashboard document.
///
/// # Errors
///
/// Returns an error if translations are missing.
pub fn render_dashboard(ctx: &RenderContext<'_>) -> std::result::Result<Document, RenderError> {
    let t = ctx.bundle("Dashboard")?;
    let meta = PageMeta::from_bundle(&t)?;
    let name = ctx.user.map(|u| u.greeting_name()).unwrap_or_default();

    let body = Markup::render(&DashboardTemplate {
        welcome: t.format("welcome", &[("name", name)])?,
        description: t.text("description")?,
        chat_title: t.text("chat_card_title")?,
        chat_description: t.text("chat_card_description")?,
        chat_button: t.text("chat_card_button")?,
        chat_href: ctx.href("/chat"),
        account_title: t.text("account_title")?,
        account_description: t.text("account_description")?,
        delete_button: t.text("delete_button")?,
        delete_confirm: t.text("delete_confirm")?,
        delete_failed: t.text("delete_failed")?,
        home_href: ctx.href("/"),
    })?;

    layout::compose(LayoutChain::DASHBOARD, ctx, meta, body)
}

/// Render the chat document.
///
/// # Errors
///
/// Returns an error if translations are missing.
pub fn render_chat(ctx: &RenderContext<'_>) -> std::result::Result<Document, RenderError> {
    let t = ctx.bundle("Chat")?;
    let meta = PageMeta::from_bundle(&t)?;

    let body = Markup::render(&ChatTemplate {
        title: t.text("title")?,
        empty_title: t.text("empty_title")?,
        empty_description: t.text("empty_description")?,
        placeholder: t.text("placeholder")?,
        send: t.text("send")?,
    })?;

    layout::compose(LayoutChain::CHAT, ctx, meta, body)
}

/// Display the dashboard.
pub async fn dashboard(
    State(state): State<AppState>,
    locale: ResolvedLocale,
    RequireUser(session): RequireUser,
    Query(notice): Query<NoticeQuery>,
) -> Result<Document> {
    let ctx = RenderContext::new(locale.locale, &locale.path, state.catalog())
        .with_user(Some(&session.user))
        .with_access_denied(notice.access_denied());
    Ok(render_dashboard(&ctx)?)
}

/// Display the chat page.
pub async fn chat(
    State(state): State<AppState>,
    locale: ResolvedLocale,
    RequireUser(session): RequireUser,
    Query(notice): Query<NoticeQuery>,
) -> Result<Document> {
    let ctx = RenderContext::new(locale.locale, &locale.path, state.catalog())
        .with_user(Some(&session.user))
        .with_access_denied(notice.access_denied());
    Ok(render_chat(&ctx)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::i18n::Catalog;
    use crate::identity::AuthUser;
    use health_companion_core::Locale;

    fn user() -> AuthUser {
        AuthUser {
            id: "6f1b3c7e-2a44-4d1e-9a4f-0c8e5b1d2e3f".parse().unwrap(),
            email: None,
            display_name: Some("Ada".to_string()),
            admin_flag: false,
        }
    }

    #[test]
    fn test_notice_query_marker() {
        let denied = NoticeQuery {
            error: Some("access_denied".to_string()),
        };
        assert!(denied.access_denied());
        assert!(!NoticeQuery::default().access_denied());
        assert!(!NoticeQuery { error: Some("other".to_string()) }.access_denied());
    }

    #[test]
    fn test_dashboard_is_wrapped_in_shell_and_scaffold() {
        let catalog = Catalog::embedded().unwrap();
        let user = user();
        let ctx = RenderContext::new(Locale::En, "/dashboard", &catalog).with_user(Some(&user));
        let html = render_dashboard(&ctx).unwrap().render().unwrap();

        let shell = html.find("class=\"shell\"").unwrap();
        let scaffold = html.find("class=\"scaffold\"").unwrap();
        let welcome = html.find("Welcome, Ada").unwrap();
        assert!(shell < scaffold && scaffold < welcome);
        assert!(html.contains("data-delete-account"));
    }

    #[test]
    fn test_chat_uses_dashboard_menu() {
        let catalog = Catalog::embedded().unwrap();
        let user = user();
        let ctx = RenderContext::new(Locale::Fr, "/chat", &catalog).with_user(Some(&user));
        let html = render_chat(&ctx).unwrap().render().unwrap();
        assert!(html.contains(r#"data-menu-href="/fr/dashboard""#));
        assert!(html.contains(r#"data-menu-href="/fr/chat""#));
    }
}
