//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::WebConfig;
use crate::i18n::Catalog;
use crate::identity::{AuthEvents, IdentityProvider};
use crate::mail::{Mailer, MockMailer};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// identity provider, translations, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    identity: Arc<dyn IdentityProvider>,
    catalog: Catalog,
    mailer: Arc<dyn Mailer>,
    auth_events: AuthEvents,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Mail goes to [`MockMailer`].
    ///
    /// # Arguments
    ///
    /// * `config` - Web configuration
    /// * `identity` - Identity provider client
    /// * `catalog` - Loaded translations
    #[must_use]
    pub fn new(config: WebConfig, identity: Arc<dyn IdentityProvider>, catalog: Catalog) -> Self {
        Self::with_mailer(config, identity, catalog, Arc::new(MockMailer))
    }

    /// Create application state with an explicit mail transport.
    #[must_use]
    pub fn with_mailer(
        config: WebConfig,
        identity: Arc<dyn IdentityProvider>,
        catalog: Catalog,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                identity,
                catalog,
                mailer,
                auth_events: AuthEvents::new(),
            }),
        }
    }

    /// Get a reference to the web configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Get the identity provider.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.identity.as_ref()
    }

    /// Get the translation catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get the mail transport.
    #[must_use]
    pub fn mailer(&self) -> &dyn Mailer {
        self.inner.mailer.as_ref()
    }

    /// Get the auth-state event channel.
    #[must_use]
    pub fn auth_events(&self) -> &AuthEvents {
        &self.inner.auth_events
    }

    /// Whether the configured admin allow-list or metadata grants access.
    #[must_use]
    pub fn is_admin(&self, user: Option<&crate::identity::AuthUser>) -> bool {
        crate::identity::is_admin(user, &self.inner.config.admin_emails)
    }
}
