//! GoTrue REST client (the auth API behind Supabase projects).

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use health_companion_core::{Email, UserId};

use super::{AccessToken, AuthUser, IdentityError, IdentityProvider, SignedIn};
use crate::config::IdentityConfig;

/// HTTP client for the provider's `/auth/v1` endpoints.
#[derive(Clone)]
pub struct GoTrueClient {
    http: Client,
    auth_url: String,
    anon_key: String,
    service_role_key: Option<SecretString>,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    user: UserRecord,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

impl From<UserRecord> for AuthUser {
    fn from(record: UserRecord) -> Self {
        let metadata_str = |key: &str| {
            record
                .user_metadata
                .get(key)
                .and_then(serde_json::Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_owned)
        };
        let display_name = metadata_str("name").or_else(|| metadata_str("full_name"));
        let admin_flag = record.user_metadata.get("isAdmin") == Some(&serde_json::Value::Bool(true));

        Self {
            id: record.id,
            email: record.email.as_deref().and_then(|e| Email::parse(e).ok()),
            display_name,
            admin_flag,
        }
    }
}

// =============================================================================
// Client
// =============================================================================

impl GoTrueClient {
    /// Create a client for the configured project.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            http: Client::new(),
            auth_url: format!("{}/auth/v1", config.url.as_str().trim_end_matches('/')),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.auth_url)
    }

    /// Attach the public key and a user token.
    fn as_user(&self, request: RequestBuilder, token: &AccessToken) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(token.expose())
    }

    /// Attach the service-role key to an admin request.
    fn as_admin(&self, request: RequestBuilder) -> Result<RequestBuilder, IdentityError> {
        let key = self
            .service_role_key
            .as_ref()
            .ok_or(IdentityError::AdminUnavailable)?
            .expose_secret();
        Ok(request.header("apikey", key).bearer_auth(key))
    }
}

/// Turn a non-success response into `IdentityError::Provider`.
async fn provider_error(response: Response) -> IdentityError {
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    IdentityError::Provider { status, message }
}

/// Statuses GoTrue uses for tokens it does not (or no longer) accept.
const fn is_rejected_token(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
    )
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    #[instrument(skip_all)]
    async fn get_user(&self, token: &AccessToken) -> Result<Option<AuthUser>, IdentityError> {
        let response = self
            .as_user(self.http.get(self.endpoint("user")), token)
            .send()
            .await?;

        let status = response.status();
        if is_rejected_token(status) {
            tracing::debug!(%status, "Provider rejected access token");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(provider_error(response).await);
        }

        let body = response.text().await?;
        let record: UserRecord = serde_json::from_str(&body)?;
        Ok(Some(record.into()))
    }

    #[instrument(skip_all)]
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Option<SignedIn>, IdentityError> {
        let response = self
            .http
            .post(self.endpoint("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant {
                email: email.as_str(),
                password: password.expose_secret(),
            })
            .send()
            .await?;

        let status = response.status();
        if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(provider_error(response).await);
        }

        let body = response.text().await?;
        let token: TokenResponse = serde_json::from_str(&body)?;
        Ok(Some(SignedIn {
            access_token: AccessToken::parse(&token.access_token)?,
            expires_in: token.expires_in,
            user: token.user.into(),
        }))
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, token: &AccessToken) -> Result<(), IdentityError> {
        let response = self
            .as_user(self.http.post(self.endpoint("logout")), token)
            .send()
            .await?;

        let status = response.status();
        // A token the provider no longer knows is already signed out.
        if status.is_success() || is_rejected_token(status) {
            return Ok(());
        }
        Err(provider_error(response).await)
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn delete_user(&self, id: &UserId) -> Result<(), IdentityError> {
        let request = self.as_admin(self.http.delete(self.endpoint(&format!("admin/users/{id}"))))?;
        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }
        Ok(())
    }

    #[instrument(skip_all)]
    async fn health(&self) -> Result<(), IdentityError> {
        let response = self
            .http
            .get(self.endpoint("health"))
            .header("apikey", &self.anon_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(provider_error(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const USER_ID: &str = "6f1b3c7e-2a44-4d1e-9a4f-0c8e5b1d2e3f";
    const TOKEN: &str = "header.payload.signature";

    fn client(server: &MockServer, service_role_key: Option<&str>) -> GoTrueClient {
        GoTrueClient::new(&IdentityConfig {
            url: Url::parse(&server.uri()).unwrap(),
            anon_key: "anon".to_string(),
            service_role_key: service_role_key.map(SecretString::from),
        })
    }

    fn token() -> AccessToken {
        AccessToken::parse(TOKEN).unwrap()
    }

    #[tokio::test]
    async fn test_get_user_maps_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("apikey", "anon"))
            .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": USER_ID,
                "email": "ada@example.com",
                "user_metadata": { "full_name": "Ada Lovelace", "isAdmin": true }
            })))
            .mount(&server)
            .await;

        let user = client(&server, None).get_user(&token()).await.unwrap().unwrap();
        assert_eq!(user.id.to_string(), USER_ID);
        assert_eq!(user.email.unwrap().as_str(), "ada@example.com");
        assert_eq!(user.display_name.as_deref(), Some("Ada Lovelace"));
        assert!(user.admin_flag);
    }

    #[tokio::test]
    async fn test_get_user_admin_flag_must_be_boolean_true() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": USER_ID,
                "user_metadata": { "isAdmin": "true" }
            })))
            .mount(&server)
            .await;

        let user = client(&server, None).get_user(&token()).await.unwrap().unwrap();
        assert!(!user.admin_flag);
        assert!(user.email.is_none());
    }

    #[tokio::test]
    async fn test_get_user_rejected_token_is_anonymous() {
        for status in [401, 403, 404] {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/auth/v1/user"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;

            let user = client(&server, None).get_user(&token()).await.unwrap();
            assert!(user.is_none(), "status {status} should mean no session");
        }
    }

    #[tokio::test]
    async fn test_get_user_server_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client(&server, None).get_user(&token()).await.unwrap_err();
        assert!(matches!(err, IdentityError::Provider { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_sign_in_with_password() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(body_json(json!({ "email": "ada@example.com", "password": "pw" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": TOKEN,
                "token_type": "bearer",
                "expires_in": 3600,
                "refresh_token": "r",
                "user": { "id": USER_ID, "email": "ada@example.com" }
            })))
            .mount(&server)
            .await;

        let signed_in = client(&server, None)
            .sign_in_with_password(
                &Email::parse("ada@example.com").unwrap(),
                &SecretString::from("pw"),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(signed_in.access_token.expose(), TOKEN);
        assert_eq!(signed_in.expires_in, 3600);
        assert_eq!(signed_in.user.id.to_string(), USER_ID);
    }

    #[tokio::test]
    async fn test_sign_in_bad_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let result = client(&server, None)
            .sign_in_with_password(
                &Email::parse("ada@example.com").unwrap(),
                &SecretString::from("wrong"),
            )
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_tolerates_stale_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        assert!(client(&server, None).sign_out(&token()).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_user_uses_service_role_key() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(format!("/auth/v1/admin/users/{USER_ID}")))
            .and(header("apikey", "service-key"))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let id: UserId = USER_ID.parse().unwrap();
        client(&server, Some("service-key")).delete_user(&id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_user_without_service_role_key() {
        let server = MockServer::start().await;
        let id: UserId = USER_ID.parse().unwrap();

        let err = client(&server, None).delete_user(&id).await.unwrap_err();
        assert!(matches!(err, IdentityError::AdminUnavailable));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_user_failure() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
            .mount(&server)
            .await;

        let id: UserId = USER_ID.parse().unwrap();
        let err = client(&server, Some("service-key")).delete_user(&id).await.unwrap_err();
        assert!(matches!(err, IdentityError::Provider { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/health"))
            .and(header("apikey", "anon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "GoTrue" })))
            .mount(&server)
            .await;

        assert!(client(&server, None).health().await.is_ok());
    }

    #[tokio::test]
    async fn test_health_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server, None).health().await.unwrap_err();
        assert!(matches!(err, IdentityError::Provider { status: 503, .. }));
    }
}
