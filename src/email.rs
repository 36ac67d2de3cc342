//! Outbound email delivery.
//!
//! Reset emails are rendered from an embedded Handlebars template and handed to an
//! `EmailSender`. With an API URL configured, `ApiEmailSender` posts them to a
//! transactional email HTTP API (`api-key` header, JSON body with `sender`,
//! `to`, `subject` and `htmlContent`). Without one, `LogEmailSender` logs the
//! message and reports success, which is what local development uses.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use handlebars::Handlebars;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use url::Url;

use crate::credentials::CredentialRecord;

const RESET_PASSWORD_TEMPLATE: &str = include_str!("../templates/reset_password.html");
const RESET_PASSWORD_SUBJECT: &str = "Password reset request";

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html_body: String,
}

/// Email delivery abstraction.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error describing why it was not sent.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            "email send stub"
        );
        Ok(())
    }
}

#[derive(Clone)]
pub struct EmailConfig {
    api_url: Option<Url>,
    api_key: Option<SecretString>,
    sender_email: String,
    sender_name: String,
}

impl EmailConfig {
    #[must_use]
    pub fn new(sender_email: String, sender_name: String) -> Self {
        Self {
            api_url: None,
            api_key: None,
            sender_email,
            sender_name,
        }
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: Option<Url>) -> Self {
        self.api_url = api_url;
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<SecretString>) -> Self {
        self.api_key = api_key;
        self
    }

    #[must_use]
    pub fn api_url(&self) -> Option<&Url> {
        self.api_url.as_ref()
    }

    #[must_use]
    pub fn sender_email(&self) -> &str {
        &self.sender_email
    }

    #[must_use]
    pub fn sender_name(&self) -> &str {
        &self.sender_name
    }

    /// Pick the sender matching this configuration.
    ///
    /// # Errors
    /// Returns an error if an API URL is set without an API key, or the HTTP
    /// client cannot be built.
    pub fn build_sender(&self) -> Result<Arc<dyn EmailSender>> {
        match &self.api_url {
            Some(api_url) => {
                let api_key = self
                    .api_key
                    .clone()
                    .ok_or_else(|| anyhow!("an email API key is required with an email API URL"))?;
                Ok(Arc::new(ApiEmailSender::new(
                    api_url.clone(),
                    api_key,
                    self.sender_email.clone(),
                    self.sender_name.clone(),
                )?))
            }
            None => {
                info!("no email API configured, reset emails will only be logged");
                Ok(Arc::new(LogEmailSender))
            }
        }
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_url", &self.api_url.as_ref().map(Url::as_str))
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("sender_email", &self.sender_email)
            .field("sender_name", &self.sender_name)
            .finish()
    }
}

#[derive(Serialize)]
struct Mailbox<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    sender: Mailbox<'a>,
    to: Vec<Mailbox<'a>>,
    subject: &'a str,
    html_content: &'a str,
}

/// Sender backed by a transactional email HTTP API.
pub struct ApiEmailSender {
    client: Client,
    api_url: Url,
    api_key: SecretString,
    sender_email: String,
    sender_name: String,
}

impl ApiEmailSender {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        api_url: Url,
        api_key: SecretString,
        sender_email: String,
        sender_name: String,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("failed to build email HTTP client")?;
        Ok(Self {
            client,
            api_url,
            api_key,
            sender_email,
            sender_name,
        })
    }

    fn request_body<'a>(&'a self, message: &'a EmailMessage) -> SendRequest<'a> {
        SendRequest {
            sender: Mailbox {
                email: &self.sender_email,
                name: Some(&self.sender_name),
            },
            to: vec![Mailbox {
                email: &message.to_email,
                name: message.to_name.as_deref(),
            }],
            subject: &message.subject,
            html_content: &message.html_body,
        }
    }
}

#[async_trait]
impl EmailSender for ApiEmailSender {
    #[instrument(skip_all, fields(to_email = %message.to_email))]
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let response = self
            .client
            .post(self.api_url.clone())
            .header("accept", "application/json")
            .header("api-key", self.api_key.expose_secret())
            .json(&self.request_body(message))
            .send()
            .await
            .context("failed to reach email API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("email API returned {status}: {body}"));
        }
        Ok(())
    }
}

const RESET_PASSWORD_TEMPLATE_NAME: &str = "reset_password";

/// Handlebars registry holding the email templates, compiled once.
#[derive(Clone, Debug)]
pub struct EmailTemplates {
    registry: Arc<Handlebars<'static>>,
}

impl EmailTemplates {
    /// Compile the embedded templates.
    ///
    /// # Errors
    /// Returns an error if a template fails to parse.
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry
            .register_template_string(RESET_PASSWORD_TEMPLATE_NAME, RESET_PASSWORD_TEMPLATE)
            .context("invalid reset password template")?;
        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    /// Reset email addressed to the record's owner, linking to `reset_url`.
    ///
    /// The name is HTML-escaped. `reset_url` is inserted verbatim and must be
    /// built from a validated base URL.
    ///
    /// # Errors
    /// Returns an error if rendering fails.
    pub fn reset_password_message(
        &self,
        record: &CredentialRecord,
        reset_url: &str,
    ) -> Result<EmailMessage> {
        let display_name = record.name.as_deref().unwrap_or(&record.document);
        let html_body = self
            .registry
            .render(
                RESET_PASSWORD_TEMPLATE_NAME,
                &json!({ "name": display_name, "url": reset_url }),
            )
            .context("failed to render reset password email")?;

        Ok(EmailMessage {
            to_email: record.email.clone(),
            to_name: record.name.clone(),
            subject: RESET_PASSWORD_SUBJECT.to_string(),
            html_body,
        })
    }
}
