//! Hosted identity provider integration.
//!
//! # Architecture
//!
//! - The provider (a GoTrue-compatible REST API) owns users and sessions
//! - The app only relays the cookie-carried access token; nothing is stored
//! - [`IdentityProvider`] is the seam handlers depend on; [`GoTrueClient`]
//!   is the production implementation, tests substitute an in-memory one
//!
//! # Capabilities consumed
//!
//! | Capability               | Used by                                   |
//! |--------------------------|-------------------------------------------|
//! | current user from token  | session resolution (pages, guard, API)    |
//! | password sign-in         | `POST /sign-in`                           |
//! | sign out                 | `/sign-out`, account deletion             |
//! | delete user by id        | `DELETE /api/profile/delete`              |
//! | health                   | `GET /health/ready`                       |

mod events;
mod gotrue;

pub use events::{AuthEvent, AuthEvents, AuthSubscription, spawn_audit_logger};
pub use gotrue::GoTrueClient;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use health_companion_core::{Email, UserId};

/// Name of the cookie carrying the provider access token.
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";

/// Longest access token accepted from a cookie.
const MAX_TOKEN_LENGTH: usize = 4096;

/// Errors that can occur when talking to the identity provider.
///
/// "No session" is not an error: lookups return `Ok(None)` for anonymous
/// requests and for tokens the provider no longer accepts.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed (provider unreachable, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with an unexpected status.
    #[error("Provider error ({status}): {message}")]
    Provider {
        /// HTTP status returned by the provider.
        status: u16,
        /// Provider error body or description.
        message: String,
    },

    /// Provider response could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The credential cookie is present but not a well-formed token.
    #[error("Malformed credential")]
    MalformedCredential,

    /// Admin operations need the service-role key, which is not configured.
    #[error("Admin interface not configured")]
    AdminUnavailable,
}

/// An access token issued by the provider.
///
/// Wrapped in a secret so it never appears in logs or `Debug` output.
#[derive(Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    /// Validate the raw cookie value.
    ///
    /// Tokens are JWTs, so only the base64url alphabet and `.` are allowed.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::MalformedCredential` for empty, oversized, or
    /// non-token values.
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        let well_formed = !raw.is_empty()
            && raw.len() <= MAX_TOKEN_LENGTH
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));

        if well_formed {
            Ok(Self(SecretString::from(raw.to_owned())))
        } else {
            Err(IdentityError::MalformedCredential)
        }
    }

    /// Raw token for the `Authorization` header or the session cookie.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Request-scoped, read-only view of the provider's user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Provider user id.
    pub id: UserId,
    /// Primary e-mail, if the account has one.
    pub email: Option<Email>,
    /// `user_metadata.name` or `user_metadata.full_name`.
    pub display_name: Option<String>,
    /// `user_metadata.isAdmin`, only when it is exactly `true`.
    pub admin_flag: bool,
}

impl AuthUser {
    /// Name to greet the user with.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        self.display_name
            .as_deref()
            .or_else(|| self.email.as_ref().map(Email::local_part))
            .unwrap_or_default()
    }
}

/// Tokens returned by a successful sign-in.
#[derive(Debug, Clone)]
pub struct SignedIn {
    /// The signed-in user.
    pub user: AuthUser,
    /// Access token to store in the session cookie.
    pub access_token: AccessToken,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// Operations the application consumes from the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Look up the user owning `token`.
    ///
    /// Returns `Ok(None)` when the provider no longer accepts the token.
    async fn get_user(&self, token: &AccessToken) -> Result<Option<AuthUser>, IdentityError>;

    /// Exchange e-mail and password for a session.
    ///
    /// Returns `Ok(None)` for rejected credentials.
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Option<SignedIn>, IdentityError>;

    /// Revoke the session behind `token`.
    async fn sign_out(&self, token: &AccessToken) -> Result<(), IdentityError>;

    /// Irrecoverably delete a user through the privileged admin interface.
    async fn delete_user(&self, id: &UserId) -> Result<(), IdentityError>;

    /// Check that the provider is reachable and healthy.
    async fn health(&self) -> Result<(), IdentityError>;
}

/// Whether `user` may enter the admin section.
///
/// The metadata flag wins; otherwise the user's e-mail must appear in the
/// configured allow-list (entries are already lower-cased).
#[must_use]
pub fn is_admin(user: Option<&AuthUser>, admin_emails: &[String]) -> bool {
    let Some(user) = user else {
        return false;
    };

    if user.admin_flag {
        return true;
    }

    user.email
        .as_ref()
        .is_some_and(|email| admin_emails.iter().any(|allowed| email.matches(allowed)))
}
