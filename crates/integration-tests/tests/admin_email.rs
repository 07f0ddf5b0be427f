//! Admin test e-mails through `POST /api/admin/email/test`.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use health_companion_integration_tests::{FailingMailer, FakeIdentity, TestApp, user};

const ENDPOINT: &str = "/api/admin/email/test";
const ADMIN_TOKEN: &str = "admin-session-token";
const USER_TOKEN: &str = "user-session-token";
const WELCOME: &str = r#"{"template":"welcome","email":"someone@example.com"}"#;

fn identity() -> Arc<FakeIdentity> {
    let identity = FakeIdentity::new();
    identity.add_session(
        ADMIN_TOKEN,
        user("0b7d9e44-5c1a-4f7e-8e2b-3a6c9d0f1e2a", "ops@example.com"),
    );
    identity.add_session(
        USER_TOKEN,
        user("6f1b3c7e-2a44-4d1e-9a4f-0c8e5b1d2e3f", "grace@example.com"),
    );
    identity
}

#[tokio::test]
async fn test_admin_sends_test_email() {
    let app = TestApp::new(identity());

    let response = app
        .post_json(
            ENDPOINT,
            Some(ADMIN_TOKEN),
            r#"{"template":"password-reset","email":"someone@example.com","data":{"name":"Ada"}}"#,
        )
        .await;

    assert_eq!(response.status, 200);
    let body = response.json();
    assert_eq!(body["success"], true);
    assert!(body["messageId"].as_str().unwrap().ends_with("-password-reset"));
    assert_eq!(
        body["message"],
        "Test email would be sent to someone@example.com in production"
    );
}

#[tokio::test]
async fn test_anonymous_caller_is_unauthorized() {
    let app = TestApp::new(identity());

    for token in [None, Some("not-a-live-session"), Some("bad%token")] {
        let response = app.post_json(ENDPOINT, token, WELCOME).await;
        assert_eq!(response.status, 401, "token {token:?}");
        assert_eq!(response.json()["code"], "AUTH_REQUIRED");
    }
}

#[tokio::test]
async fn test_non_admin_is_forbidden() {
    let app = TestApp::new(identity());

    let response = app.post_json(ENDPOINT, Some(USER_TOKEN), WELCOME).await;

    assert_eq!(response.status, 403);
    let body = response.json();
    assert_eq!(body["code"], "FORBIDDEN");
    assert_eq!(body["error"], "Admin access required");
}

#[tokio::test]
async fn test_forbidden_before_validation() {
    let app = TestApp::new(identity());

    let response = app.post_json(ENDPOINT, Some(USER_TOKEN), "not json").await;

    assert_eq!(response.status, 403);
}

#[tokio::test]
async fn test_invalid_bodies_are_rejected() {
    let app = TestApp::new(identity());

    for body in [
        "not json",
        r#"{"template":"newsletter","email":"someone@example.com"}"#,
        r#"{"template":"welcome"}"#,
        r#"{"template":"welcome","email":"someone@example.com","data":"x"}"#,
    ] {
        let response = app.post_json(ENDPOINT, Some(ADMIN_TOKEN), body).await;
        assert_eq!(response.status, 400, "body {body}");
        let json = response.json();
        assert_eq!(json["code"], "INVALID_REQUEST");
        assert_eq!(json["error"], "Invalid request body");
        assert!(json["details"]["reason"].is_string());
    }
}

#[tokio::test]
async fn test_invalid_recipient_names_the_field() {
    let app = TestApp::new(identity());

    let response = app
        .post_json(
            ENDPOINT,
            Some(ADMIN_TOKEN),
            r#"{"template":"welcome","email":"not-an-address"}"#,
        )
        .await;

    assert_eq!(response.status, 400);
    let body = response.json();
    assert_eq!(body["code"], "INVALID_REQUEST");
    assert_eq!(body["error"], "Validation failed");
    assert_eq!(body["details"]["field"], "email");
}

#[tokio::test]
async fn test_transport_failure_is_internal_error() {
    let app = TestApp::with_mailer(identity(), Arc::new(FailingMailer));

    let response = app.post_json(ENDPOINT, Some(ADMIN_TOKEN), WELCOME).await;

    assert_eq!(response.status, 500);
    let body = response.json();
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert_eq!(body["error"], "Failed to send test email");
    assert!(!response.body.contains("connection refused"));
}

#[tokio::test]
async fn test_provider_outage_is_internal_error() {
    let identity = identity();
    identity.fail_lookups();
    let app = TestApp::new(identity);

    let response = app.post_json(ENDPOINT, Some(ADMIN_TOKEN), WELCOME).await;

    assert_eq!(response.status, 500);
    let body = response.json();
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn test_admin_email_page_posts_to_endpoint() {
    let app = TestApp::new(identity());

    let response = app.get_as("/admin/email", ADMIN_TOKEN).await;

    assert_eq!(response.status, 200);
    assert!(response.body.contains(r#"data-endpoint="/api/admin/email/test""#));
    assert!(response.body.contains(r#"<option value="verify-email">"#));
}
