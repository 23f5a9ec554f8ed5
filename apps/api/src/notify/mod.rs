//! Customer and admin email notifications.

pub mod templates;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::models::order::EmailPreview;

const SEND_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Email API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("ADMIN_EMAIL is not set")]
    NoAdminRecipient,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// True when messages are only recorded, never delivered.
    fn is_preview(&self) -> bool;
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError>;
}

/// Logs instead of sending; the rendered message is kept on the order.
pub struct PreviewMailer;

#[async_trait]
impl Mailer for PreviewMailer {
    fn is_preview(&self) -> bool {
        true
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
        info!("Email preview generated for {}: {}", email.to, email.subject);
        Ok(())
    }
}

/// Posts `{from, to, subject, html}` to a transactional email API.
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: Option<String>, from: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    fn is_preview(&self) -> bool {
        false
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
        let mut request = self
            .client
            .post(&self.api_url)
            .timeout(SEND_TIMEOUT)
            .json(&ApiMessage {
                from: &self.from,
                to: &email.to,
                subject: &email.subject,
                html: &email.html,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                message,
            });
        }
        info!("Email sent to {}: {}", email.to, email.subject);
        Ok(())
    }
}

pub struct AdminAlert<'a> {
    pub subject: &'a str,
    pub title: &'a str,
    pub order_id: &'a str,
    pub customer_email: &'a str,
    pub details: String,
}

#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    admin_email: Option<String>,
    total_slots: u32,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, admin_email: Option<String>, total_slots: u32) -> Self {
        Self {
            mailer,
            admin_email,
            total_slots,
        }
    }

    async fn deliver(&self, to: &str, rendered: templates::Rendered) -> Result<EmailPreview, NotifyError> {
        let email = OutgoingEmail {
            to: to.to_string(),
            subject: rendered.subject,
            html: rendered.html,
        };
        self.mailer.send(&email).await?;
        Ok(EmailPreview {
            subject: email.subject,
            html: email.html,
            preview: self.mailer.is_preview(),
        })
    }

    pub async fn confirmation(
        &self,
        to: &str,
        order_id: &str,
        eta_minutes: u32,
    ) -> Result<EmailPreview, NotifyError> {
        self.deliver(to, templates::confirmation(order_id, eta_minutes, Utc::now()))
            .await
    }

    pub async fn completed(
        &self,
        to: &str,
        site_url: &str,
        download_url: Option<&str>,
        position: u32,
    ) -> Result<EmailPreview, NotifyError> {
        let rendered = templates::completed(site_url, download_url, position, self.total_slots);
        self.deliver(to, rendered).await
    }

    pub async fn sold_out(&self, to: &str) -> Result<EmailPreview, NotifyError> {
        self.deliver(to, templates::sold_out(self.total_slots)).await
    }

    pub async fn admin_alert(&self, alert: AdminAlert<'_>) -> Result<(), NotifyError> {
        let to = self.admin_email.as_deref().ok_or(NotifyError::NoAdminRecipient)?;
        let html = templates::admin_alert(
            alert.title,
            alert.order_id,
            alert.customer_email,
            &alert.details,
            Utc::now(),
        );
        self.mailer
            .send(&OutgoingEmail {
                to: to.to_string(),
                subject: alert.subject.to_string(),
                html,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl Mailer for Recording {
        fn is_preview(&self) -> bool {
            false
        }

        async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
            self.sent.lock().await.push(email.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_preview_mailer_marks_previews() {
        let notifier = Notifier::new(Arc::new(PreviewMailer), None, 50);
        let preview = notifier.confirmation("a@b.com", "o1", 3).await.unwrap();
        assert!(preview.preview);
        assert_eq!(preview.subject, "Order Confirmed (Order o1)");
        assert!(preview.html.contains("3 minutes"));
    }

    #[tokio::test]
    async fn test_admin_alert_goes_to_admin() {
        let mailer = Arc::new(Recording::default());
        let notifier = Notifier::new(mailer.clone(), Some("ops@folio.test".into()), 50);
        notifier
            .admin_alert(AdminAlert {
                subject: "Deploy failed",
                title: "Deploy failed",
                order_id: "o1",
                customer_email: "a@b.com",
                details: "timeout".into(),
            })
            .await
            .unwrap();

        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ops@folio.test");
        assert!(sent[0].html.contains("timeout"));
    }

    #[tokio::test]
    async fn test_admin_alert_without_recipient_fails() {
        let notifier = Notifier::new(Arc::new(PreviewMailer), None, 50);
        let result = notifier
            .admin_alert(AdminAlert {
                subject: "x",
                title: "x",
                order_id: "o1",
                customer_email: "a@b.com",
                details: String::new(),
            })
            .await;
        assert!(matches!(result, Err(NotifyError::NoAdminRecipient)));
    }

    #[tokio::test]
    async fn test_sold_out_uses_capacity() {
        let mailer = Arc::new(Recording::default());
        let notifier = Notifier::new(mailer.clone(), None, 20);
        let preview = notifier.sold_out("a@b.com").await.unwrap();
        assert!(!preview.preview);
        assert!(preview.html.contains("20-customer limit"));
        assert_eq!(mailer.sent.lock().await[0].to, "a@b.com");
    }
}
