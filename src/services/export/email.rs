//! SendGrid v3 delivery of exported PDF reports.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::config::EmailConfig;
use crate::error::{AppError, AppResult};

pub const ATTACHMENT_NAME: &str = "test_report.pdf";

/// Sends report e-mails through the SendGrid HTTP API.
#[derive(Clone)]
pub struct SendGridMailer {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    sender: String,
    api_url: String,
}

impl std::fmt::Debug for SendGridMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendGridMailer")
            .field("configured", &self.api_key.is_some())
            .field("sender", &self.sender)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl SendGridMailer {
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.sendgrid_api_key.clone(),
            sender: config.sender.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send `pdf` to `recipient` as `test_report.pdf`.
    pub async fn send_report(
        &self,
        recipient: &str,
        subject: &str,
        html_body: &str,
        pdf: &[u8],
    ) -> AppResult<()> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| AppError::Email("SendGrid API key is not configured".to_string()))?;

        let payload = json!({
            "personalizations": [{ "to": [{ "email": recipient }] }],
            "from": { "email": self.sender },
            "subject": subject,
            "content": [{ "type": "text/html", "value": html_body }],
            "attachments": [{
                "content": STANDARD.encode(pdf),
                "filename": ATTACHMENT_NAME,
                "type": "application/pdf",
                "disposition": "attachment",
            }],
        });

        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.api_url))
            .bearer_auth(api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Email(format!("SendGrid request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Email(format!(
                "SendGrid responded with {}: {}",
                status, body
            )));
        }

        tracing::info!(recipient = %recipient, bytes = pdf.len(), "Report e-mail sent");
        Ok(())
    }
}
