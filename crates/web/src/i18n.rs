//! Translation catalog.
//!
//! Messages are JSON documents, one per locale, grouped into nested
//! namespaces (`"Admin": { "Email": { ... } }` is the `Admin.Email`
//! namespace). A page asks for one namespace bundle and reads keys from it.
//!
//! # Fallback policy
//!
//! 1. A namespace missing from the requested locale is served from
//!    [`Locale::DEFAULT`].
//! 2. A key missing from the requested locale's bundle is read from the
//!    default locale's bundle.
//! 3. Anything missing from the default locale too is an error. Pages never
//!    render raw keys or blank strings in its place.

use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;

use health_companion_core::Locale;

/// Errors raised while loading or reading translations.
#[derive(Debug, Error)]
pub enum I18nError {
    /// No locale defines the namespace.
    #[error("missing translation namespace '{namespace}' for locale '{locale}'")]
    MissingNamespace { locale: Locale, namespace: String },

    /// The namespace exists but lacks the key in every candidate locale.
    #[error("missing translation key '{namespace}.{key}' for locale '{locale}'")]
    MissingKey {
        locale: Locale,
        namespace: String,
        key: String,
    },

    /// A message file is not a JSON object.
    #[error("invalid message catalog for locale '{locale}': {reason}")]
    InvalidCatalog { locale: Locale, reason: String },

    /// The default locale has no message file.
    #[error("no messages for default locale '{0}'")]
    MissingDefaultLocale(Locale),
}

/// All translations, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    messages: HashMap<Locale, Map<String, Value>>,
}

impl Catalog {
    /// Catalog compiled into the binary from `crates/web/messages`.
    ///
    /// # Errors
    ///
    /// Returns an error if a bundled message file is malformed.
    pub fn embedded() -> Result<Self, I18nError> {
        Self::from_json([
            (Locale::En, include_str!("../messages/en.json")),
            (Locale::Fr, include_str!("../messages/fr.json")),
        ])
    }

    /// Build a catalog from raw JSON documents.
    ///
    /// # Errors
    ///
    /// Returns an error if a document is not a JSON object or the default
    /// locale is absent.
    pub fn from_json<'a>(
        documents: impl IntoIterator<Item = (Locale, &'a str)>,
    ) -> Result<Self, I18nError> {
        let mut messages = HashMap::new();
        for (locale, raw) in documents {
            let value: Value =
                serde_json::from_str(raw).map_err(|e| I18nError::InvalidCatalog {
                    locale,
                    reason: e.to_string(),
                })?;
            let Value::Object(map) = value else {
                return Err(I18nError::InvalidCatalog {
                    locale,
                    reason: "top level must be an object".to_string(),
                });
            };
            messages.insert(locale, map);
        }

        if !messages.contains_key(&Locale::DEFAULT) {
            return Err(I18nError::MissingDefaultLocale(Locale::DEFAULT));
        }

        Ok(Self { messages })
    }

    /// Fetch the bundle for `namespace` (dot-separated) in `locale`.
    ///
    /// # Errors
    ///
    /// Returns `I18nError::MissingNamespace` if neither `locale` nor the
    /// default locale defines the namespace.
    pub fn bundle(&self, locale: Locale, namespace: &str) -> Result<Bundle<'_>, I18nError> {
        let lookup = |l: Locale| {
            self.messages
                .get(&l)
                .and_then(|root| find_object(root, namespace))
        };

        let primary = lookup(locale);
        let fallback = if locale.is_default() {
            None
        } else {
            lookup(Locale::DEFAULT)
        };

        if primary.is_none() && fallback.is_none() {
            return Err(I18nError::MissingNamespace {
                locale,
                namespace: namespace.to_string(),
            });
        }

        Ok(Bundle {
            locale,
            namespace: namespace.to_string(),
            primary,
            fallback,
        })
    }
}

/// Walk a dot-separated path of nested objects.
fn find_object<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Map<String, Value>> {
    path.split('.')
        .try_fold(root, |current, segment| current.get(segment)?.as_object())
}

/// Walk a dot-separated key to a string leaf.
fn find_string<'a>(bundle: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (find_object(bundle, parents)?, leaf),
        None => (bundle, key),
    };
    parents.get(leaf)?.as_str()
}

/// The strings of one namespace for one request's locale.
#[derive(Debug, Clone)]
pub struct Bundle<'a> {
    locale: Locale,
    namespace: String,
    primary: Option<&'a Map<String, Value>>,
    fallback: Option<&'a Map<String, Value>>,
}

impl Bundle<'_> {
    /// Read a key (dot-separated for nested groups).
    ///
    /// # Errors
    ///
    /// Returns `I18nError::MissingKey` if no candidate locale has the key.
    pub fn text(&self, key: &str) -> Result<String, I18nError> {
        self.primary
            .and_then(|m| find_string(m, key))
            .or_else(|| self.fallback.and_then(|m| find_string(m, key)))
            .map(str::to_owned)
            .ok_or_else(|| I18nError::MissingKey {
                locale: self.locale,
                namespace: self.namespace.clone(),
                key: key.to_string(),
            })
    }

    /// Read a key and substitute `{name}` placeholders.
    ///
    /// # Errors
    ///
    /// Returns `I18nError::MissingKey` if no candidate locale has the key.
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> Result<String, I18nError> {
        let template = self.text(key)?;
        Ok(args.iter().fold(template, |acc, (name, value)| {
            acc.replace(&format!("{{{name}}}"), value)
        }))
    }
}
