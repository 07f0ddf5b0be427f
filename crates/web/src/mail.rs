//! Transactional e-mail.
//!
//! Only the admin test utility sends mail today. [`MockMailer`] accepts every
//! message and logs it instead of delivering; a real transport plugs in
//! behind [`Mailer`].

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use health_companion_core::Email;

/// Templates the test utility can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MailTemplate {
    Welcome,
    PasswordReset,
    VerifyEmail,
}

impl MailTemplate {
    /// Wire name of the template.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::PasswordReset => "password-reset",
            Self::VerifyEmail => "verify-email",
        }
    }
}

impl fmt::Display for MailTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A test message: template, recipient and template variables.
#[derive(Debug, Clone)]
pub struct TestEmail {
    pub template: MailTemplate,
    pub to: Email,
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// Errors from a mail transport.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail transport failed: {0}")]
    Transport(String),
}

/// Something that can send mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send `email`, returning the transport's message id.
    async fn send_test(&self, email: &TestEmail) -> Result<String, MailError>;
}

/// Accepts every message without delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockMailer;

#[async_trait]
impl Mailer for MockMailer {
    async fn send_test(&self, email: &TestEmail) -> Result<String, MailError> {
        let message_id = format!(
            "mock-{}-{}",
            chrono::Utc::now().timestamp_millis(),
            email.template
        );
        tracing::info!(
            template = %email.template,
            to = %email.to,
            variables = email.data.len(),
            message_id = %message_id,
            "Test e-mail accepted by mock mailer"
        );
        Ok(message_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_template_wire_names() {
        let parsed: Vec<MailTemplate> =
            serde_json::from_str(r#"["welcome", "password-reset", "verify-email"]"#).unwrap();
        assert_eq!(
            parsed,
            [MailTemplate::Welcome, MailTemplate::PasswordReset, MailTemplate::VerifyEmail]
        );
        assert_eq!(MailTemplate::PasswordReset.to_string(), "password-reset");
        assert!(serde_json::from_str::<MailTemplate>(r#""newsletter""#).is_err());
    }

    #[tokio::test]
    async fn test_mock_mailer_names_message_after_template() {
        let email = TestEmail {
            template: MailTemplate::PasswordReset,
            to: Email::parse("someone@example.com").unwrap(),
            data: serde_json::Map::new(),
        };
        let id = MockMailer.send_test(&email).await.unwrap();
        assert!(id.starts_with("mock-"));
        assert!(id.ends_with("-password-reset"));
    }
}
