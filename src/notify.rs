//! Outbound email. Delivery is best-effort and fire-and-forget: a failed
//! send is logged and swallowed, never surfaced to the request that
//! triggered it.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::workflow::{ApprovalStatus, Department};

#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_html: String,
}

#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Posts messages to an HTTP mail gateway. When no gateway is configured
/// the send is skipped with a log line, matching a deployment that has not
/// wired up email yet.
pub struct HttpMailer {
    client: reqwest::Client,
    gateway_url: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(gateway_url: Option<String>, from: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            gateway_url,
            from: from.into(),
        }
    }
}

#[derive(Serialize)]
struct GatewayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let Some(gateway_url) = &self.gateway_url else {
            tracing::info!(to = %message.to, "mail gateway not configured; skipping email");
            return Ok(());
        };

        let payload = GatewayPayload {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            html: &message.body_html,
        };

        let response = self
            .client
            .post(gateway_url)
            .json(&payload)
            .send()
            .await
            .context("failed to reach mail gateway")?;

        response
            .error_for_status()
            .context("mail gateway rejected the message")?;

        Ok(())
    }
}

/// Sends without blocking the caller; failures are logged and dropped.
pub fn spawn_send(notifier: Arc<dyn Notifier>, message: EmailMessage) {
    tokio::spawn(async move {
        if let Err(err) = notifier.send(&message).await {
            tracing::warn!(to = %message.to, error = %err, "email delivery failed");
        }
    });
}

pub fn contractor_credentials_email(
    to: &str,
    contractor_name: &str,
    contractor_id: &str,
    access_token: &str,
    status_page_url: &str,
    company_name: &str,
) -> EmailMessage {
    let subject = format!("{company_name} - Your Application Credentials");
    let body_html = format!(
        "<html><body>\
         <h2>Welcome, {contractor_name}!</h2>\
         <p>Thank you for submitting your contractor application. \
         Keep these credentials to check your application status.</p>\
         <p><strong>Contractor ID:</strong> <code>{contractor_id}</code><br>\
         <strong>Access Token:</strong> <code>{access_token}</code></p>\
         <p>Your application goes through HR review, a medical check and a \
         safety verification; an ID card is generated on final approval.</p>\
         <p><a href=\"{status_page_url}\">Check Application Status</a></p>\
         </body></html>"
    );
    EmailMessage {
        to: to.to_string(),
        subject,
        body_html,
    }
}

pub fn decision_notification_email(
    to: &str,
    employee_name: &str,
    department: Department,
    status: ApprovalStatus,
    company_name: &str,
) -> EmailMessage {
    let subject = format!(
        "{company_name} - {} {}",
        department.display_name(),
        status.as_str().to_uppercase()
    );
    let verdict = if status == ApprovalStatus::Approved {
        "Approved"
    } else {
        "Rejected"
    };
    let body_html = format!(
        "<html><body>\
         <h2>Application Status Update</h2>\
         <p>Employee <strong>{employee_name}</strong> has been reviewed by \
         the {} department.</p>\
         <p><strong>{verdict}</strong></p>\
         <p>Please check the application portal for complete details.</p>\
         </body></html>",
        department.display_name()
    );
    EmailMessage {
        to: to.to_string(),
        subject,
        body_html,
    }
}
