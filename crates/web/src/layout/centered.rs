//! Centered single-card layout for the sign-in page and error pages.

use askama::Template;

use super::{Layout, Markup, RenderContext, RenderError};

#[derive(Template)]
#[template(path = "layouts/centered.html")]
struct CenteredTemplate {
    home_href: String,
    inner: Markup,
}

/// Centers auth forms on an otherwise empty page.
#[derive(Debug, Clone, Copy, Default)]
pub struct CenteredLayout;

impl Layout for CenteredLayout {
    fn wrap(&self, inner: Markup, ctx: &RenderContext<'_>) -> Result<Markup, RenderError> {
        Markup::render(&CenteredTemplate {
            home_href: ctx.href("/"),
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
    fn test_wraps_card_with_localized_home_link() {
        let catalog = Catalog::embedded().unwrap();
        let ctx = RenderContext::new(Locale::Fr, "/sign-in", &catalog);
        let out = CenteredLayout
            .wrap(Markup("<form></form>".to_string()), &ctx)
            .unwrap();
        let html = out.as_str();
        assert!(html.contains(r#"class="centered-home" href="/fr""#));
        assert!(html.find("centered-card").unwrap() < html.find("<form>").unwrap());
    }
}
