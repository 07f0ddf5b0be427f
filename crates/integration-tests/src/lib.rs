//! Integration tests for HealthCompanion.
//!
//! The tests drive the real application router in-process with
//! `tower::ServiceExt::oneshot`. The identity provider is replaced by
//! [`FakeIdentity`], an in-memory implementation of the same trait, or by
//! the real GoTrue client pointed at a `wiremock` server.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p health-companion-integration-tests
//! ```

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::{ExposeSecret, SecretString};
use tower::ServiceExt;
use url::Url;

use health_companion_core::{Email, UserId};
use health_companion_web::config::{IdentityConfig, WebConfig};
use health_companion_web::i18n::Catalog;
use health_companion_web::identity::{
    ACCESS_TOKEN_COOKIE, AccessToken, AuthUser, IdentityError, IdentityProvider, SignedIn,
};
use health_companion_web::mail::{MailError, Mailer, TestEmail};
use health_companion_web::state::AppState;

/// Build a user record.
///
/// # Panics
///
/// Panics if `id` is not a UUID or `email` is not an address.
#[must_use]
#[allow(clippy::expect_used)]
pub fn user(id: &str, email: &str) -> AuthUser {
    AuthUser {
        id: id.parse().expect("valid user id"),
        email: Some(Email::parse(email).expect("valid email")),
        display_name: None,
        admin_flag: false,
    }
}

#[derive(Default)]
struct FakeState {
    sessions: HashMap<String, AuthUser>,
    passwords: HashMap<String, (String, String)>,
    deleted: Vec<UserId>,
    signed_out: Vec<String>,
    fail_lookups: bool,
    fail_deletes: bool,
    fail_sign_out: bool,
    admin_key_missing: bool,
}

/// In-memory identity provider.
///
/// Sessions are keyed by access token. Deleting a user invalidates every
/// token that belongs to them, the way the hosted provider does.
#[derive(Default)]
pub struct FakeIdentity {
    state: Mutex<FakeState>,
}

impl FakeIdentity {
    /// Provider with no users.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a live session.
    pub fn add_session(&self, token: &str, user: AuthUser) {
        self.lock().sessions.insert(token.to_string(), user);
    }

    /// Register password credentials that sign in as `token`'s user.
    pub fn add_password(&self, email: &str, password: &str, token: &str, user: AuthUser) {
        let mut state = self.lock();
        state
            .passwords
            .insert(email.to_string(), (password.to_string(), token.to_string()));
        state.sessions.insert(token.to_string(), user);
    }

    /// Make every session lookup fail as if the provider were down.
    pub fn fail_lookups(&self) {
        self.lock().fail_lookups = true;
    }

    /// Make admin deletions fail.
    pub fn fail_deletes(&self) {
        self.lock().fail_deletes = true;
    }

    /// Make sign-out fail.
    pub fn fail_sign_out(&self) {
        self.lock().fail_sign_out = true;
    }

    /// Behave as if no service-role key were configured.
    pub fn without_admin_key(&self) {
        self.lock().admin_key_missing = true;
    }

    /// Ids passed to `delete_user`, in call order.
    #[must_use]
    pub fn deleted(&self) -> Vec<UserId> {
        self.lock().deleted.clone()
    }

    /// Tokens passed to `sign_out`, in call order.
    #[must_use]
    pub fn signed_out(&self) -> Vec<String> {
        self.lock().signed_out.clone()
    }
}

fn provider_down() -> IdentityError {
    IdentityError::Provider {
        status: 502,
        message: "upstream unavailable".to_string(),
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn get_user(&self, token: &AccessToken) -> Result<Option<AuthUser>, IdentityError> {
        let state = self.lock();
        if state.fail_lookups {
            return Err(provider_down());
        }
        Ok(state.sessions.get(token.expose()).cloned())
    }

    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Option<SignedIn>, IdentityError> {
        let state = self.lock();
        let Some((expected, token)) = state.passwords.get(email.as_str()) else {
            return Ok(None);
        };
        if expected != password.expose_secret() {
            return Ok(None);
        }
        let Some(user) = state.sessions.get(token).cloned() else {
            return Ok(None);
        };
        Ok(Some(SignedIn {
            user,
            access_token: AccessToken::parse(token)?,
            expires_in: 3600,
        }))
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), IdentityError> {
        let mut state = self.lock();
        state.signed_out.push(token.expose().to_string());
        if state.fail_sign_out {
            return Err(provider_down());
        }
        state.sessions.remove(token.expose());
        Ok(())
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), IdentityError> {
        let mut state = self.lock();
        if state.admin_key_missing {
            return Err(IdentityError::AdminUnavailable);
        }
        if state.fail_deletes {
            return Err(IdentityError::Provider {
                status: 500,
                message: "database error deleting user".to_string(),
            });
        }
        state.deleted.push(*id);
        state.sessions.retain(|_, user| user.id != *id);
        Ok(())
    }

    async fn health(&self) -> Result<(), IdentityError> {
        if self.lock().fail_lookups {
            return Err(provider_down());
        }
        Ok(())
    }
}

/// Mail transport that refuses every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send_test(&self, _email: &TestEmail) -> Result<String, MailError> {
        Err(MailError::Transport("connection refused".to_string()))
    }
}

/// Configuration for tests; the provider URL is only used by the GoTrue client.
///
/// # Panics
///
/// Panics if `provider_url` is not a URL.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_config(provider_url: &str, service_role_key: Option<&str>) -> WebConfig {
    WebConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        identity: IdentityConfig {
            url: Url::parse(provider_url).expect("valid provider url"),
            anon_key: "anon-key".to_string(),
            service_role_key: service_role_key.map(SecretString::from),
        },
        admin_emails: vec!["ops@example.com".to_string()],
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// The application under test.
pub struct TestApp {
    router: Router,
    state: AppState,
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// `Location` header, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Every `Set-Cookie` header.
    #[must_use]
    pub fn set_cookies(&self) -> Vec<&str> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// Body parsed as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("response body is JSON")
    }
}

impl TestApp {
    /// Application backed by `identity` with the default test configuration.
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self::with_config(identity, test_config("http://identity.invalid", Some("unused")))
    }

    /// Application backed by `identity` with `config`.
    ///
    /// # Panics
    ///
    /// Panics if the embedded translations do not load.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_config(identity: Arc<dyn IdentityProvider>, config: WebConfig) -> Self {
        let catalog = Catalog::embedded().expect("embedded catalog loads");
        Self::from_state(AppState::new(config, identity, catalog))
    }

    /// Application backed by `identity` that sends mail through `mailer`.
    ///
    /// # Panics
    ///
    /// Panics if the embedded translations do not load.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_mailer(identity: Arc<dyn IdentityProvider>, mailer: Arc<dyn Mailer>) -> Self {
        let catalog = Catalog::embedded().expect("embedded catalog loads");
        let config = test_config("http://identity.invalid", Some("unused"));
        Self::from_state(AppState::with_mailer(config, identity, catalog, mailer))
    }

    fn from_state(state: AppState) -> Self {
        Self {
            router: health_companion_web::app(state.clone()),
            state,
        }
    }

    /// Shared application state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Send a request, optionally with a session cookie and a form body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        form: Option<&str>,
    ) -> TestResponse {
        let body = form.map(|form| ("application/x-www-form-urlencoded", form));
        self.send_body(method, uri, token, body).await
    }

    /// Send a request with an optional `(content type, body)` pair.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    #[allow(clippy::expect_used)]
    pub async fn send_body(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<(&str, &str)>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("{ACCESS_TOKEN_COOKIE}={token}"));
        }
        let body = match body {
            Some((content_type, body)) => {
                builder = builder.header(header::CONTENT_TYPE, content_type);
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("valid request"))
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// `GET` without a session.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, None).await
    }

    /// `GET` with a session cookie.
    pub async fn get_as(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(token), None).await
    }

    /// `DELETE` with an optional session cookie.
    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// `POST` a JSON body with an optional session cookie.
    pub async fn post_json(&self, uri: &str, token: Option<&str>, json: &str) -> TestResponse {
        self.send_body(Method::POST, uri, token, Some(("application/json", json)))
            .await
    }

    /// `POST` a urlencoded form.
    pub async fn post_form(&self, uri: &str, form: &str) -> TestResponse {
        self.send(Method::POST, uri, None, Some(form)).await
    }
}
