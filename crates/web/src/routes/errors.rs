//! Localized error pages.

use askama::Template;

use crate::error::ErrorPage;
use crate::layout::{self, Document, LayoutChain, Markup, PageMeta, RenderContext, RenderError};

#[derive(Template)]
#[template(path = "pages/error.html")]
struct ErrorTemplate {
    kind: &'static str,
    title: String,
    description: String,
    home_href: String,
    back_home: String,
}

/// Render the document for `page` in the request's locale.
///
/// # Errors
///
/// Returns an error if the `Errors` translations are missing.
pub fn render(ctx: &RenderContext<'_>, page: ErrorPage) -> Result<Document, RenderError> {
    let t = ctx.bundle("Errors")?;
    let key = page.key();
    let title = t.text(&format!("{key}.title"))?;
    let description = t.text(&format!("{key}.description"))?;

    let body = Markup::render(&ErrorTemplate {
        kind: key,
        title: title.clone(),
        description: description.clone(),
        home_href: ctx.href("/"),
        back_home: t.text("backHome")?,
    })?;

    layout::compose(LayoutChain::ERROR, ctx, PageMeta { title, description }, body)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::i18n::Catalog;
    use health_companion_core::Locale;

    #[test]
    fn test_error_page_is_localized() {
        let catalog = Catalog::embedded().unwrap();
        let ctx = RenderContext::new(Locale::Fr, "/nowhere", &catalog);
        let html = render(&ctx, ErrorPage::NotFound).unwrap().render().unwrap();
        assert!(html.contains(r#"<html lang="fr">"#));
        assert!(html.contains("<title>Page introuvable</title>"));
        assert!(html.contains(r#"data-error="notFound""#));
        assert!(html.contains(r#"href="/fr""#));
    }

    #[test]
    fn test_every_error_page_renders_in_default_locale() {
        let catalog = Catalog::embedded().unwrap();
        let ctx = RenderContext::new(Locale::En, "/", &catalog);
        for page in [ErrorPage::NotFound, ErrorPage::Unavailable, ErrorPage::Internal] {
            let html = render(&ctx, page).unwrap().render().unwrap();
            assert!(html.contains(&format!(r#"data-error="{}""#, page.key())));
        }
    }
}
