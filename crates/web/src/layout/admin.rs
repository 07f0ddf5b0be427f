//! Admin section chrome.

use askama::Template;

use super::{Layout, Markup, RenderContext, RenderError};

struct NavItem {
    href: String,
    label: String,
    active: bool,
}

#[derive(Template)]
#[template(path = "layouts/admin_shell.html")]
struct AdminShellTemplate {
    panel_label: String,
    nav: Vec<NavItem>,
    back_href: String,
    back_label: String,
    inner: Markup,
}

/// Sidebar and header of the admin section.
///
/// Rendered unconditionally: requests only get here through the admin
/// guard on the `/admin` subtree.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminShell;

impl Layout for AdminShell {
    fn wrap(&self, inner: Markup, ctx: &RenderContext<'_>) -> Result<Markup, RenderError> {
        let t = ctx.bundle("Admin")?;
        let nav = [("/admin", "nav_overview"), ("/admin/email", "nav_email")]
            .into_iter()
            .map(|(path, key)| {
                Ok(NavItem {
                    href: ctx.href(path),
                    label: t.text(key)?,
                    active: ctx.path == path,
                })
            })
            .collect::<Result<Vec<_>, RenderError>>()?;

        Markup::render(&AdminShellTemplate {
            panel_label: t.text("panel_label")?,
            nav,
            back_href: ctx.href("/dashboard"),
            back_label: t.text("back_to_app")?,
            inner,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::i18n::Catalog;
    use health_companion_core::Locale;

    #[test]
    fn test_french_falls_back_to_default_admin_strings() {
        let catalog = Catalog::embedded().unwrap();
        let en = AdminShell
            .wrap(Markup::default(), &RenderContext::new(Locale::En, "/admin", &catalog))
            .unwrap();
        let fr = AdminShell
            .wrap(Markup::default(), &RenderContext::new(Locale::Fr, "/admin", &catalog))
            .unwrap();
        assert_eq!(
            fr.as_str().replace("/fr/", "/").replace("\"/fr\"", "\"/\""),
            en.as_str()
        );
    }

    #[test]
    fn test_renders_without_user() {
        let catalog = Catalog::embedded().unwrap();
        let ctx = RenderContext::new(Locale::En, "/admin/email", &catalog);
        let out = AdminShell.wrap(Markup("<p>x</p>".to_string()), &ctx).unwrap();
        assert!(out.as_str().contains("<p>x</p>"));
        assert!(out.as_str().contains(r#"href="/admin/email" aria-current="page""#));
    }
}
