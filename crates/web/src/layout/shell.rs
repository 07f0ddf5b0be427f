//! Root shell shared by the signed-in, non-admin sections.

use askama::Template;

use super::{Layout, Markup, RenderContext, RenderError};

/// A link to the current page under one supported locale.
#[derive(Debug, Clone)]
pub struct LanguageLink {
    pub tag: &'static str,
    pub name: &'static str,
    pub href: String,
    pub current: bool,
}

/// Destructive toast shown after the admin guard turned the user away.
struct Toast {
    title: String,
    description: String,
    dismiss: String,
}

#[derive(Template)]
#[template(path = "layouts/root_shell.html")]
struct RootShellTemplate {
    app_name: String,
    home_href: String,
    language_label: String,
    languages: Vec<LanguageLink>,
    signed_in_as: Option<String>,
    sign_out_label: String,
    sign_out_href: String,
    toast: Option<Toast>,
    inner: Markup,
}

/// Header with app name, language selector and the signed-in user, above a
/// width-constrained content area.
#[derive(Debug, Clone, Copy, Default)]
pub struct RootShell;

impl Layout for RootShell {
    fn wrap(&self, inner: Markup, ctx: &RenderContext<'_>) -> Result<Markup, RenderError> {
        let t = ctx.bundle("AppShell")?;

        let signed_in_as = ctx
            .user
            .map(|user| t.format("signed_in_as", &[("name", user.greeting_name())]))
            .transpose()?;

        let toast = if ctx.access_denied {
            let errors = ctx.bundle("Errors")?;
            Some(Toast {
                title: errors.text("admin.accessDenied")?,
                description: errors.text("admin.contactAdmin")?,
                dismiss: errors.text("dismiss")?,
            })
        } else {
            None
        };

        Markup::render(&RootShellTemplate {
            app_name: t.text("app_name")?,
            home_href: ctx.href("/dashboard"),
            language_label: t.text("language")?,
            languages: ctx.language_links(),
            signed_in_as,
            sign_out_label: t.text("sign_out")?,
            sign_out_href: ctx.href("/sign-out"),
            toast,
            inner,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::i18n::Catalog;
    use crate::identity::AuthUser;
    use health_companion_core::{Email, Locale};

    fn user() -> AuthUser {
        AuthUser {
            id: "6f1b3c7e-2a44-4d1e-9a4f-0c8e5b1d2e3f".parse().unwrap(),
            email: Some(Email::parse("ada@example.com").unwrap()),
            display_name: Some("Ada".to_string()),
            admin_flag: false,
        }
    }

    #[test]
    fn test_inner_appears_exactly_once() {
        let catalog = Catalog::embedded().unwrap();
        let ctx = RenderContext::new(Locale::En, "/dashboard", &catalog);
        let out = RootShell
            .wrap(Markup("<section id=\"inner\"></section>".to_string()), &ctx)
            .unwrap();
        assert_eq!(out.as_str().matches("<section id=\"inner\"></section>").count(), 1);
    }

    #[test]
    fn test_shows_signed_in_user() {
        let catalog = Catalog::embedded().unwrap();
        let user = user();
        let ctx = RenderContext::new(Locale::En, "/dashboard", &catalog).with_user(Some(&user));
        let out = RootShell.wrap(Markup::default(), &ctx).unwrap();
        assert!(out.as_str().contains("Signed in as Ada"));
        assert!(out.as_str().contains(r#"href="/sign-out""#));
    }

    #[test]
    fn test_toast_only_with_access_denied_marker() {
        let catalog = Catalog::embedded().unwrap();
        let ctx = RenderContext::new(Locale::En, "/dashboard", &catalog);
        let plain = RootShell.wrap(Markup::default(), &ctx).unwrap();
        assert!(!plain.as_str().contains("data-toast"));

        let denied = RootShell
            .wrap(Markup::default(), &ctx.with_access_denied(true))
            .unwrap();
        assert!(denied.as_str().contains("data-toast=\"access-denied\""));
        assert!(denied.as_str().contains("/static/js/access-denied.js"));
    }

    #[test]
    fn test_links_carry_locale_prefix() {
        let catalog = Catalog::embedded().unwrap();
        let ctx = RenderContext::new(Locale::Fr, "/chat", &catalog);
        let out = RootShell.wrap(Markup::default(), &ctx).unwrap();
        assert!(out.as_str().contains(r#"href="/fr/sign-out""#));
        assert!(out.as_str().contains(r#"href="/chat""#));
    }
}
