//! Page composition.
//!
//! A page handler renders its body, then applies the [`LayoutChain`] of its
//! route group, then wraps the result in a [`Document`].
//!
//! # Route groups
//!
//! | Group      | Chain (outermost first)                  |
//! |------------|------------------------------------------|
//! | landing    | none                                     |
//! | sign-in    | [`CenteredLayout`]                       |
//! | dashboard  | [`RootShell`], [`DashboardScaffold`]     |
//! | chat       | [`RootShell`], [`ChatLayout`]            |
//! | admin      | [`AdminShell`]                           |
//!
//! Layouts receive the inner markup and the request's [`RenderContext`]
//! explicitly. Each one emits the inner markup exactly once and never looks
//! inside it.

mod admin;
mod centered;
mod scaffold;
mod shell;

pub use admin::AdminShell;
pub use centered::CenteredLayout;
pub use scaffold::{ChatLayout, DashboardScaffold, MENU, MenuEntry};
pub use shell::{LanguageLink, RootShell};

use std::fmt;

use askama::Template;
use askama_web::WebTemplate;
use thiserror::Error;

use health_companion_core::Locale;

use crate::i18n::{Bundle, Catalog, I18nError};
use crate::identity::AuthUser;

/// Errors that stop a page from rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A translation namespace or key is missing in every candidate locale.
    #[error(transparent)]
    I18n(#[from] I18nError),

    /// Askama failed to render a template.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
}

/// Rendered HTML that is emitted without further escaping.
///
/// Only produced by rendering an askama template, which escapes every
/// interpolated value itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
    /// Render a template into markup.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::Template` if rendering fails.
    pub fn render(template: &impl Template) -> Result<Self, RenderError> {
        Ok(Self(template.render()?))
    }

    /// The HTML text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything a page or layout may read about the current request.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Locale resolved from the URL.
    pub locale: Locale,
    /// Request path with the locale prefix removed.
    pub path: &'a str,
    /// Signed-in user, if any.
    pub user: Option<&'a AuthUser>,
    /// Translation catalog.
    pub catalog: &'a Catalog,
    /// Whether the request carries the `access_denied` marker.
    pub access_denied: bool,
}

impl<'a> RenderContext<'a> {
    /// Context for an anonymous request to `path`.
    #[must_use]
    pub const fn new(locale: Locale, path: &'a str, catalog: &'a Catalog) -> Self {
        Self {
            locale,
            path,
            user: None,
            catalog,
            access_denied: false,
        }
    }

    /// Attach the signed-in user.
    #[must_use]
    pub const fn with_user(mut self, user: Option<&'a AuthUser>) -> Self {
        self.user = user;
        self
    }

    /// Mark the request as redirected by the admin guard.
    #[must_use]
    pub const fn with_access_denied(mut self, access_denied: bool) -> Self {
        self.access_denied = access_denied;
        self
    }

    /// Translations of `namespace` in the request locale.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::I18n` if the namespace exists in no locale.
    pub fn bundle(&self, namespace: &str) -> Result<Bundle<'a>, RenderError> {
        Ok(self.catalog.bundle(self.locale, namespace)?)
    }

    /// `path` under the request locale's prefix.
    #[must_use]
    pub fn href(&self, path: &str) -> String {
        self.locale.href(path)
    }

    /// One link per supported locale to the current page.
    #[must_use]
    pub fn language_links(&self) -> Vec<LanguageLink> {
        Locale::ALL
            .iter()
            .map(|&locale| LanguageLink {
                tag: locale.tag(),
                name: locale.native_name(),
                href: locale.href(self.path),
                current: locale == self.locale,
            })
            .collect()
    }
}

/// A wrapper that contributes chrome around inner content.
pub trait Layout: Send + Sync {
    /// Wrap `inner`, which must appear in the output exactly once and
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout's own strings or template fail.
    fn wrap(&self, inner: Markup, ctx: &RenderContext<'_>) -> Result<Markup, RenderError>;
}

/// Ordered layouts of a route group, outermost first.
#[derive(Clone, Copy)]
pub struct LayoutChain(&'static [&'static dyn Layout]);

impl LayoutChain {
    /// Landing page: no chrome beyond the document.
    pub const LANDING: Self = Self(&[]);
    /// Sign-in area.
    pub const SIGN_IN: Self = Self(&[&CenteredLayout]);
    /// Localized error pages.
    pub const ERROR: Self = Self(&[&CenteredLayout]);
    /// Dashboard area.
    pub const DASHBOARD: Self = Self(&[&RootShell, &DashboardScaffold]);
    /// Chat area.
    pub const CHAT: Self = Self(&[&RootShell, &ChatLayout]);
    /// Admin section.
    pub const ADMIN: Self = Self(&[&AdminShell]);

    /// Build a chain from layouts listed outermost first.
    #[must_use]
    pub const fn new(layers: &'static [&'static dyn Layout]) -> Self {
        Self(layers)
    }

    /// Apply every layer, innermost first, so the first layer ends up
    /// outermost.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a layer.
    pub fn apply(&self, body: Markup, ctx: &RenderContext<'_>) -> Result<Markup, RenderError> {
        self.0
            .iter()
            .rev()
            .try_fold(body, |inner, layer| layer.wrap(inner, ctx))
    }
}

impl fmt::Debug for LayoutChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutChain")
            .field("layers", &self.0.len())
            .finish()
    }
}

/// Route metadata taken from the page's translation bundle.
#[derive(Debug, Clone)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
}

impl PageMeta {
    /// Read `meta_title` and `meta_description` from `bundle`.
    ///
    /// # Errors
    ///
    /// Returns `RenderError::I18n` if either key is missing.
    pub fn from_bundle(bundle: &Bundle<'_>) -> Result<Self, RenderError> {
        Ok(Self {
            title: bundle.text("meta_title")?,
            description: bundle.text("meta_description")?,
        })
    }
}

/// The complete HTML document.
#[derive(Template, WebTemplate)]
#[template(path = "document.html")]
pub struct Document {
    pub lang: &'static str,
    pub title: String,
    pub description: String,
    pub body: Markup,
}

/// Compose a page: apply `chain` to `body` and wrap it in a document.
///
/// # Errors
///
/// Returns the first layout error.
pub fn compose(
    chain: LayoutChain,
    ctx: &RenderContext<'_>,
    meta: PageMeta,
    body: Markup,
) -> Result<Document, RenderError> {
    let body = chain.apply(body, ctx)?;
    Ok(Document {
        lang: ctx.locale.tag(),
        title: meta.title,
        description: meta.description,
        body,
    })
}
