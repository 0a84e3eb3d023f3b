//! Notify Module - Outbound messages to guests and hosts
//!
//! - Email through a transactional email HTTP API
//! - WhatsApp template messages through a Cloud-API style HTTP API
//! - In-app notification documents, pushed live over the WebSocket
//!
//! Every sender is fire-and-forget from the point of view of the handlers:
//! the `spawn_*` helpers run the request on its own task, log failures and
//! never report them back.

pub mod in_app;

pub use in_app::{notify_user, spawn_notify_user};

use crate::core::config::{EmailConfig, WhatsAppConfig};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("{0} sender is not configured")]
    Disabled(&'static str),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider answered with status {0}")]
    Rejected(u16),
}

#[derive(Clone)]
pub struct Notifier {
    client: Client,
    email: Option<Arc<EmailConfig>>,
    whatsapp: Option<Arc<WhatsAppConfig>>,
}

impl Notifier {
    pub fn new(email: Option<EmailConfig>, whatsapp: Option<WhatsAppConfig>) -> Self {
        Self {
            client: Client::new(),
            email: email.map(Arc::new),
            whatsapp: whatsapp.map(Arc::new),
        }
    }

    pub fn email_enabled(&self) -> bool {
        self.email.is_some()
    }

    pub fn whatsapp_enabled(&self) -> bool {
        self.whatsapp.is_some()
    }

    /// Sends one plain text email
    #[instrument(skip(self, subject, text))]
    pub async fn send_email(&self, to: &str, subject: &str, text: &str) -> Result<(), NotifyError> {
        let config = self.email.as_ref().ok_or(NotifyError::Disabled("email"))?;

        let response = self
            .client
            .post(&config.api_url)
            .bearer_auth(&config.api_key)
            .json(&json!({
                "from": config.from,
                "to": to,
                "subject": subject,
                "text": text,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }
        debug!("Email accepted by provider");
        Ok(())
    }

    /// Sends a WhatsApp template message, `params` fill the body placeholders in order
    #[instrument(skip(self, params))]
    pub async fn send_whatsapp_template(
        &self,
        phone: &str,
        template: TemplateKind,
        params: &[String],
    ) -> Result<(), NotifyError> {
        let config = self
            .whatsapp
            .as_ref()
            .ok_or(NotifyError::Disabled("whatsapp"))?;

        let template_name = match template {
            TemplateKind::RsvpConfirmation => &config.rsvp_template,
            TemplateKind::OtpCode => &config.otp_template,
        };
        let parameters: Vec<_> = params
            .iter()
            .map(|p| json!({ "type": "text", "text": p }))
            .collect();

        let response = self
            .client
            .post(&config.api_url)
            .bearer_auth(&config.api_token)
            .json(&json!({
                "messaging_product": "whatsapp",
                "to": format!("{}{}", config.country_code, phone),
                "type": "template",
                "template": {
                    "name": template_name,
                    "language": { "code": "en" },
                    "components": [{ "type": "body", "parameters": parameters }],
                },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }
        debug!("WhatsApp message accepted by provider");
        Ok(())
    }

    /// Emails in the background, failures are only logged
    pub fn spawn_email(&self, to: String, subject: String, text: String) {
        if !self.email_enabled() {
            debug!("Email sender disabled, skipping message");
            return;
        }
        let notifier = self.clone();
        tokio::spawn(async move {
            match notifier.send_email(&to, &subject, &text).await {
                Ok(()) => info!("Email sent"),
                Err(e) => warn!("Failed to send email: {}", e),
            }
        });
    }

    /// WhatsApp in the background, failures are only logged
    pub fn spawn_whatsapp(&self, phone: String, template: TemplateKind, params: Vec<String>) {
        if !self.whatsapp_enabled() {
            debug!("WhatsApp sender disabled, skipping message");
            return;
        }
        let notifier = self.clone();
        tokio::spawn(async move {
            match notifier.send_whatsapp_template(&phone, template, &params).await {
                Ok(()) => info!("WhatsApp message sent"),
                Err(e) => warn!("Failed to send WhatsApp message: {}", e),
            }
        });
    }
}

#[derive(Debug, Clone, Copy)]
pub enum TemplateKind {
    RsvpConfirmation,
    OtpCode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::State, http::HeaderMap, http::StatusCode, routing::post};
    use serde_json::Value;
    use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

    type Captured = (Option<String>, Value);

    async fn capture(
        State(tx): State<UnboundedSender<Captured>>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> StatusCode {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let _ = tx.send((auth, body));
        StatusCode::OK
    }

    /// Starts a throwaway provider answering `status`, returns its URL
    async fn fake_provider(status: StatusCode) -> (String, tokio::sync::mpsc::UnboundedReceiver<Captured>) {
        let (tx, rx) = unbounded_channel();
        let app = if status.is_success() {
            Router::new().route("/send", post(capture)).with_state(tx)
        } else {
            Router::new()
                .route("/send", post(move || async move { status }))
                .with_state(tx)
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/send"), rx)
    }

    fn whatsapp(api_url: String) -> WhatsAppConfig {
        WhatsAppConfig {
            api_url,
            api_token: "wa-token".to_string(),
            rsvp_template: "rsvp_confirmation".to_string(),
            otp_template: "otp_code".to_string(),
            country_code: "91".to_string(),
        }
    }

    #[tokio::test]
    async fn test_email_payload_and_bearer() {
        let (url, mut rx) = fake_provider(StatusCode::OK).await;
        let notifier = Notifier::new(
            Some(EmailConfig {
                api_url: url,
                api_key: "mail-key".to_string(),
                from: "events@guestlist.local".to_string(),
            }),
            None,
        );

        notifier
            .send_email("bob@gmail.com", "You're in", "See you there")
            .await
            .unwrap();

        let (auth, body) = rx.recv().await.unwrap();
        assert_eq!(auth.as_deref(), Some("Bearer mail-key"));
        assert_eq!(body["to"], "bob@gmail.com");
        assert_eq!(body["from"], "events@guestlist.local");
        assert_eq!(body["subject"], "You're in");
    }

    #[tokio::test]
    async fn test_whatsapp_template_prefixes_country_code() {
        let (url, mut rx) = fake_provider(StatusCode::OK).await;
        let notifier = Notifier::new(None, Some(whatsapp(url)));

        notifier
            .send_whatsapp_template("9123456780", TemplateKind::OtpCode, &["123456".to_string()])
            .await
            .unwrap();

        let (auth, body) = rx.recv().await.unwrap();
        assert_eq!(auth.as_deref(), Some("Bearer wa-token"));
        assert_eq!(body["to"], "919123456780");
        assert_eq!(body["template"]["name"], "otp_code");
        assert_eq!(
            body["template"]["components"][0]["parameters"][0]["text"],
            "123456"
        );
    }

    #[tokio::test]
    async fn test_provider_rejection_is_reported() {
        let (url, _rx) = fake_provider(StatusCode::BAD_GATEWAY).await;
        let notifier = Notifier::new(None, Some(whatsapp(url)));

        let err = notifier
            .send_whatsapp_template("9123456780", TemplateKind::RsvpConfirmation, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Rejected(502)));
    }

    #[tokio::test]
    async fn test_disabled_sender() {
        let notifier = Notifier::new(None, None);
        assert!(!notifier.email_enabled());
        let err = notifier.send_email("a@gmail.com", "s", "t").await.unwrap_err();
        assert!(matches!(err, NotifyError::Disabled("email")));
    }
}
