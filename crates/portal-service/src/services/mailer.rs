//! SendGrid client for verification emails.
//!
//! Delivery is best-effort: callers spawn the send and log failures. When
//! no API key is configured, sending is a no-op (local development).

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use thiserror::Error;

use crate::config::Config;

/// SendGrid v3 mail send endpoint.
const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Errors that can occur when sending mail.
#[derive(Debug, Error)]
pub enum MailerError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    from: String,
    app_name: String,
    verify_base_url: String,
}

impl Mailer {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.sendgrid_api_key.clone(),
            from: config.no_reply_email.clone(),
            app_name: config.app_name.clone(),
            verify_base_url: format!(
                "{}/api/v1/auth/verify",
                config.public_base_url.trim_end_matches('/')
            ),
        }
    }

    /// Send the account verification email carrying the one-time code.
    ///
    /// Skipped (with a debug log) when no API key is configured.
    pub async fn send_verification_email(
        &self,
        recipient: &str,
        code: &str,
    ) -> Result<(), MailerError> {
        let Some(api_key) = &self.api_key else {
            tracing::debug!("Email delivery disabled, skipping verification email");
            return Ok(());
        };

        let url = format!("{}/{}", self.verify_base_url, code);
        let body = json!({
            "personalizations": [{"to": [{"email": recipient}]}],
            "from": {"email": self.from},
            "subject": format!("{} email verification", self.app_name),
            "content": [{
                "type": "text/html",
                "value": format!(
                    "An account on {} was created using this email address. \
                     Please verify it by visiting: <a href=\"{url}\">{url}</a>",
                    self.app_name
                ),
            }],
        });

        let response = self
            .client
            .post(SENDGRID_URL)
            .bearer_auth(api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
