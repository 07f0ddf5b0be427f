//! Public marketing landing page.
//!
//! Sections, top to bottom: navbar, hero, features, FAQ, call to action,
//! footer. Every section renders for anonymous visitors; a session only
//! swaps the sign-in links for dashboard links and adds a greeting.

use askama::Template;
use axum::extract::State;
use chrono::Datelike;

use crate::error::Result;
use crate::i18n::Bundle;
use crate::layout::{self, Document, LanguageLink, LayoutChain, Markup, PageMeta, RenderContext, RenderError};
use crate::middleware::{OptionalUser, ResolvedLocale};
use crate::state::AppState;

/// Number of entries in the features grid and the FAQ.
const ITEM_COUNT: usize = 3;

struct Navbar {
    home_href: String,
    links: Vec<(String, &'static str)>,
    language_label: String,
    languages: Vec<LanguageLink>,
    sign_in: Option<Link>,
    dashboard: Option<Link>,
}

struct Link {
    href: String,
    label: String,
}

struct Hero {
    greeting: Option<String>,
    title: String,
    description: String,
    primary: Link,
    secondary: Link,
}

struct Feature {
    title: String,
    description: String,
}

struct Features {
    subtitle: String,
    title: String,
    description: String,
    items: Vec<Feature>,
}

struct Faq {
    title: String,
    items: Vec<(String, String)>,
}

struct Cta {
    title: String,
    description: String,
    button: Link,
}

struct Footer {
    links: Vec<String>,
    terms: String,
    privacy: String,
    copyright: String,
}

#[derive(Template)]
#[template(path = "pages/landing.html")]
struct LandingTemplate {
    navbar: Navbar,
    hero: Hero,
    features: Features,
    faq: Faq,
    cta: Cta,
    footer: Footer,
}

fn navbar(ctx: &RenderContext<'_>) -> std::result::Result<Navbar, RenderError> {
    let t = ctx.bundle("Navbar")?;
    let links = [
        ("product", "#features"),
        ("docs", "#faq"),
        ("blog", "#features"),
        ("community", "#faq"),
        ("company", "#cta"),
    ]
    .into_iter()
    .map(|(key, anchor)| Ok((t.text(key)?, anchor)))
    .collect::<std::result::Result<Vec<_>, RenderError>>()?;

    let (sign_in, dashboard) = if ctx.user.is_some() {
        let dashboard = Link {
            href: ctx.href("/dashboard"),
            label: t.text("dashboard")?,
        };
        (None, Some(dashboard))
    } else {
        let sign_in = Link {
            href: ctx.href("/sign-in"),
            label: t.text("sign_in")?,
        };
        (Some(sign_in), None)
    };

    Ok(Navbar {
        home_href: ctx.href("/"),
        links,
        language_label: t.text("language")?,
        languages: ctx.language_links(),
        sign_in,
        dashboard,
    })
}

fn hero(ctx: &RenderContext<'_>) -> std::result::Result<Hero, RenderError> {
    let t = ctx.bundle("Hero")?;

    let greeting = ctx
        .user
        .map(|user| t.format("greeting", &[("name", user.greeting_name())]))
        .transpose()?;

    let primary = if ctx.user.is_some() {
        Link {
            href: ctx.href("/dashboard"),
            label: t.text("dashboard_button")?,
        }
    } else {
        Link {
            href: ctx.href("/sign-in"),
            label: t.text("primary_button")?,
        }
    };

    Ok(Hero {
        greeting,
        title: t.text("title")?,
        description: t.text("description")?,
        primary,
        secondary: Link {
            href: "#features".to_string(),
            label: t.text("secondary_button")?,
        },
    })
}

fn numbered(t: &Bundle<'_>, prefix: &str, suffix: &str, n: usize) -> std::result::Result<String, RenderError> {
    Ok(t.text(&format!("{prefix}{n}{suffix}"))?)
}

fn features(ctx: &RenderContext<'_>) -> std::result::Result<Features, RenderError> {
    let t = ctx.bundle("Features")?;
    let items = (1..=ITEM_COUNT)
        .map(|n| {
            Ok(Feature {
                title: numbered(&t, "feature", "_title", n)?,
                description: numbered(&t, "feature", "_description", n)?,
            })
        })
        .collect::<std::result::Result<Vec<_>, RenderError>>()?;

    Ok(Features {
        subtitle: t.text("section_subtitle")?,
        title: t.text("section_title")?,
        description: t.text("section_description")?,
        items,
    })
}

fn faq(ctx: &RenderContext<'_>) -> std::result::Result<Faq, RenderError> {
    let t = ctx.bundle("FAQ")?;
    let items = (1..=ITEM_COUNT)
        .map(|n| Ok((numbered(&t, "question", "", n)?, numbered(&t, "answer", "", n)?)))
        .collect::<std::result::Result<Vec<_>, RenderError>>()?;

    Ok(Faq {
        title: t.text("section_title")?,
        items,
    })
}

fn cta(ctx: &RenderContext<'_>) -> std::result::Result<Cta, RenderError> {
    let t = ctx.bundle("CTA")?;
    Ok(Cta {
        title: t.text("title")?,
        description: t.text("description")?,
        button: Link {
            href: ctx.href(if ctx.user.is_some() { "/dashboard" } else { "/sign-in" }),
            label: t.text("button_text")?,
        },
    })
}

fn footer(ctx: &RenderContext<'_>) -> std::result::Result<Footer, RenderError> {
    let t = ctx.bundle("Footer")?;
    let links = ["product", "docs", "blog", "community", "company"]
        .into_iter()
        .map(|key| t.text(key))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let year = chrono::Utc::now().year().to_string();

    Ok(Footer {
        links,
        terms: t.text("terms_of_service")?,
        privacy: t.text("privacy_policy")?,
        copyright: t.format("copyright", &[("year", &year)])?,
    })
}

/// Render the landing page document.
///
/// # Errors
///
/// Returns an error if a section's translations are missing.
pub fn render(ctx: &RenderContext<'_>) -> std::result::Result<Document, RenderError> {
    let meta = PageMeta::from_bundle(&ctx.bundle("Index")?)?;
    let body = Markup::render(&LandingTemplate {
        navbar: navbar(ctx)?,
        hero: hero(ctx)?,
        features: features(ctx)?,
        faq: faq(ctx)?,
        cta: cta(ctx)?,
        footer: footer(ctx)?,
    })?;
    layout::compose(LayoutChain::LANDING, ctx, meta, body)
}

/// Display the landing page.
pub async fn landing(
    State(state): State<AppState>,
    locale: ResolvedLocale,
    OptionalUser(user): OptionalUser,
) -> Result<Document> {
    let ctx = RenderContext::new(locale.locale, &locale.path, state.catalog()).with_user(user.as_ref());
    Ok(render(&ctx)?)
}
