//! Notification sink
//!
//! Delivers formatted alert text to an outbound channel. Delivery failures
//! are logged and never retried; a lost notification must not affect the
//! polling cycle.

use crate::signal::Alert;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Notification delivery errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("delivery rejected: {0}")]
    Rejected(reqwest::StatusCode),
}

/// Trait for notification channel implementations
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one alert
    async fn send(&self, alert: &Alert) -> Result<(), NotifyError>;
}

/// POSTs the alert text as JSON to a webhook URL
pub struct WebhookNotifier {
    url: String,
    client: Client,
}

impl WebhookNotifier {
    /// Create a notifier targeting the given webhook URL
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "text": alert.message }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status()));
        }
        tracing::info!(alert_id = %alert.id, "Alert delivered");
        metrics::counter!("chainpulse_notifications_total").increment(1);
        Ok(())
    }
}

/// Logs alerts instead of delivering them; used when no webhook is configured
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), NotifyError> {
        tracing::info!(message = %alert.message, "Alert (no notification channel configured)");
        Ok(())
    }
}

/// Deliver a batch of alerts, logging failures without escalating
pub async fn deliver_all(notifier: &dyn Notifier, alerts: &[Alert]) {
    for alert in alerts {
        if let Err(e) = notifier.send(alert).await {
            tracing::error!(alert_id = %alert.id, error = %e, "Notification delivery failed");
            metrics::counter!("chainpulse_notification_failures_total").increment(1);
        }
    }
}
