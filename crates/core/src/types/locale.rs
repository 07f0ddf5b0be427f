//! Supported interface locales.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A locale tag that is not in the supported set.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported locale: {0}")]
pub struct UnsupportedLocale(pub String);

/// A supported interface language.
///
/// The set is closed: every URL either names one of these tags in its
/// first path segment or is served in [`Locale::DEFAULT`].
///
/// ```
/// use health_companion_core::Locale;
///
/// assert_eq!("fr".parse::<Locale>().unwrap(), Locale::Fr);
/// assert!("de".parse::<Locale>().is_err());
/// assert_eq!(Locale::DEFAULT.path_prefix(), "");
/// assert_eq!(Locale::Fr.path_prefix(), "/fr");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English (default).
    En,
    /// French.
    Fr,
}

impl Locale {
    /// Every supported locale, in the order shown by the language selector.
    pub const ALL: [Self; 2] = [Self::En, Self::Fr];

    /// Locale used when the URL carries no locale prefix.
    pub const DEFAULT: Self = Self::En;

    /// BCP 47 tag, also used as the URL path segment.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
        }
    }

    /// Name of the language in that language.
    #[must_use]
    pub const fn native_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Fr => "Français",
        }
    }

    /// Whether this is [`Locale::DEFAULT`].
    #[must_use]
    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }

    /// URL prefix for this locale.
    ///
    /// The default locale is served without a prefix; every other locale is
    /// served under `/{tag}`.
    #[must_use]
    pub fn path_prefix(self) -> &'static str {
        match self {
            Self::En => "",
            Self::Fr => "/fr",
        }
    }

    /// Build a locale-aware link to an unprefixed application path.
    ///
    /// `path` must start with `/`.
    #[must_use]
    pub fn href(self, path: &str) -> String {
        let prefix = self.path_prefix();
        if prefix.is_empty() {
            return path.to_string();
        }
        if path == "/" {
            return prefix.to_string();
        }
        format!("{prefix}{path}")
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|locale| locale.tag() == s)
            .ok_or_else(|| UnsupportedLocale(s.to_string()))
    }
}
