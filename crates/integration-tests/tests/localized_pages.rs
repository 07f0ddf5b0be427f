//! Locale resolution and translation fallback through the full router.

use health_companion_integration_tests::{FakeIdentity, TestApp, user};

const ADMIN_ID: &str = "0b8f4c2d-1e3a-4b5c-8d7e-9f0a1b2c3d4e";
const ADMIN_TOKEN: &str = "admin-session-token";

fn app_with_admin() -> TestApp {
    let identity = FakeIdentity::new();
    identity.add_session(ADMIN_TOKEN, user(ADMIN_ID, "ops@example.com"));
    TestApp::new(identity)
}

#[tokio::test]
async fn test_default_locale_is_unprefixed() {
    let app = TestApp::new(FakeIdentity::new());

    let response = app.get("/").await;

    assert_eq!(response.status, 200);
    assert!(response.body.contains(r#"<html lang="en">"#));
}

#[tokio::test]
async fn test_prefixed_locale_renders_translation() {
    let app = TestApp::new(FakeIdentity::new());

    let response = app.get("/fr/sign-in").await;

    assert_eq!(response.status, 200);
    assert!(response.body.contains(r#"<html lang="fr">"#));
    assert!(response.body.contains("Mot de passe"));
    assert!(response.body.contains(r#"action="/fr/sign-in""#));
}

#[tokio::test]
async fn test_explicit_default_prefix_redirects() {
    let app = TestApp::new(FakeIdentity::new());

    let response = app.get("/en/sign-in?next=1").await;

    assert_eq!(response.status, 307);
    assert_eq!(response.location(), Some("/sign-in?next=1"));
}

#[tokio::test]
async fn test_explicit_default_prefix_stays_on_site() {
    let app = TestApp::new(FakeIdentity::new());

    for uri in ["/en//evil.example/phish", "/en///evil.example"] {
        let response = app.get(uri).await;
        assert_eq!(response.status, 307, "{uri}");
        let location = response.location().unwrap_or_default();
        assert!(location.starts_with('/') && !location.starts_with("//"), "{uri} -> {location}");
    }
    assert_eq!(
        app.get("/en//evil.example/phish").await.location(),
        Some("/evil.example/phish")
    );
}

#[tokio::test]
async fn test_missing_namespace_falls_back_to_default_locale() {
    let app = app_with_admin();

    let en = app.get_as("/admin/email", ADMIN_TOKEN).await;
    let fr = app.get_as("/fr/admin/email", ADMIN_TOKEN).await;

    assert_eq!(en.status, 200);
    assert_eq!(fr.status, 200);
    assert!(fr.body.contains(r#"<html lang="fr">"#));
    for text in [
        "Email testing",
        "Preview and verify the transactional e-mails sent to users.",
        "Send a test e-mail",
    ] {
        assert!(en.body.contains(text), "en missing {text}");
        assert!(fr.body.contains(text), "fr missing {text}");
    }
}

#[tokio::test]
async fn test_unknown_prefix_is_not_a_locale() {
    let app = TestApp::new(FakeIdentity::new());

    let response = app.get("/de/sign-in").await;

    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_not_found_page_is_localized() {
    let app = TestApp::new(FakeIdentity::new());

    let fr = app.get("/fr/nowhere").await;
    assert_eq!(fr.status, 404);
    assert!(fr.body.contains(r#"<html lang="fr">"#));
    assert!(fr.body.contains("<title>Page introuvable</title>"));
    assert!(fr.body.contains(r#"data-error="notFound""#));

    let en = app.get("/nowhere").await;
    assert_eq!(en.status, 404);
    assert!(en.body.contains(r#"<html lang="en">"#));
    assert!(en.body.contains("<title>Page not found</title>"));
}

#[tokio::test]
async fn test_server_error_page_is_localized() {
    let identity = FakeIdentity::new();
    identity.add_session(ADMIN_TOKEN, user(ADMIN_ID, "ops@example.com"));
    identity.fail_lookups();
    let app = TestApp::new(identity);

    let response = app.get_as("/fr/dashboard", ADMIN_TOKEN).await;

    assert_eq!(response.status, 500);
    assert!(response.body.contains("<title>Une erreur est survenue</title>"));
    assert!(response.body.contains(r#"data-error="internal""#));
    assert!(!response.body.contains("upstream unavailable"));
}

#[tokio::test]
async fn test_language_selector_links_every_locale() {
    let app = TestApp::new(FakeIdentity::new());

    let response = app.get("/fr").await;

    assert_eq!(response.status, 200);
    assert!(response.body.contains(r#"hreflang="en""#));
    assert!(response.body.contains(r#"hreflang="fr""#));
}
