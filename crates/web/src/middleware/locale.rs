//! Locale resolution from the URL path.
//!
//! Strategy: the default locale is served unprefixed (`/dashboard`), every
//! other locale under its tag (`/fr/dashboard`). An explicit default-locale
//! prefix (`/en/dashboard`) is redirected to the unprefixed URL.
//!
//! The middleware runs before routing: it strips the prefix from the URI so a
//! single route table serves every locale, and records the outcome as a
//! [`ResolvedLocale`] extension.

use axum::{
    extract::{FromRequestParts, Request},
    http::{Uri, request::Parts, uri::PathAndQuery},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use health_companion_core::Locale;

/// Path prefixes that are never localized.
const BYPASS_PREFIXES: [&str; 3] = ["/api", "/static", "/health"];

/// Outcome of resolving a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalePath<'a> {
    /// Selected locale.
    pub locale: Locale,
    /// Path with the locale segment removed; always starts with exactly
    /// one `/`.
    pub path: &'a str,
    /// Whether the path carried an explicit locale segment.
    pub prefixed: bool,
}

/// Map a path to its locale: the first segment if it is a supported tag,
/// otherwise the default locale with the path unchanged.
#[must_use]
pub fn resolve(path: &str) -> LocalePath<'_> {
    let rest = path.strip_prefix('/').unwrap_or(path);
    let (segment, tail) = rest.find('/').map_or((rest, ""), |i| rest.split_at(i));

    match Locale::ALL.into_iter().find(|l| l.tag() == segment) {
        Some(locale) => LocalePath {
            locale,
            path: if tail.trim_start_matches('/').is_empty() {
                "/"
            } else {
                collapse_leading_slashes(tail)
            },
            prefixed: true,
        },
        None => LocalePath {
            locale: Locale::DEFAULT,
            path: collapse_leading_slashes(path),
            prefixed: false,
        },
    }
}

/// Reduce a run of leading slashes to one.
///
/// `//host/x` is a network-path reference; as a `Location` or `href` it
/// would leave the site.
fn collapse_leading_slashes(path: &str) -> &str {
    let run = path.len() - path.trim_start_matches('/').len();
    if run > 1 {
        path.get(run - 1..).unwrap_or(path)
    } else {
        path
    }
}

/// Whether `path` is served without locale resolution.
#[must_use]
pub fn bypasses(path: &str) -> bool {
    BYPASS_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Locale and unprefixed path of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocale {
    pub locale: Locale,
    pub path: String,
}

impl ResolvedLocale {
    /// `path` under this request's locale prefix.
    #[must_use]
    pub fn href(&self, path: &str) -> String {
        self.locale.href(path)
    }
}

impl<S> FromRequestParts<S> for ResolvedLocale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(resolved) = parts.extensions.get::<Self>() {
            return Ok(resolved.clone());
        }

        // Outside the middleware (bypassed paths) the URI was never rewritten.
        let resolved = resolve(parts.uri.path());
        Ok(Self {
            locale: resolved.locale,
            path: resolved.path.to_owned(),
        })
    }
}

/// Resolve the locale, rewrite the URI to its unprefixed form, and record a
/// [`ResolvedLocale`] extension.
pub async fn locale_middleware(mut request: Request, next: Next) -> Response {
    let uri = request.uri();
    if bypasses(uri.path()) {
        return next.run(request).await;
    }

    let resolved = resolve(uri.path());
    let target = match uri.query() {
        Some(query) => format!("{}?{query}", resolved.path),
        None => resolved.path.to_owned(),
    };

    if resolved.prefixed && resolved.locale.is_default() {
        return Redirect::temporary(&target).into_response();
    }

    let extension = ResolvedLocale {
        locale: resolved.locale,
        path: resolved.path.to_owned(),
    };

    if resolved.prefixed {
        match rewrite(uri, &target) {
            Ok(rewritten) => *request.uri_mut() = rewritten,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to rewrite localized URI");
                return axum::http::StatusCode::BAD_REQUEST.into_response();
            }
        }
    }

    tracing::Span::current().record("locale", extension.locale.tag());
    request.extensions_mut().insert(extension);
    next.run(request).await
}

fn rewrite(uri: &Uri, path_and_query: &str) -> Result<Uri, axum::http::Error> {
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query)?);
    Ok(Uri::from_parts(parts)?)
}
