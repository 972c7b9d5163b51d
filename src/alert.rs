//! Failure alerting boundary.
//!
//! Alerts are best-effort: a sink that cannot deliver logs the problem and
//! moves on, because an alert failure must never change the run's outcome.

use crate::config::Config;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Destination for run and per-week failure notices.
#[async_trait]
pub trait Alerter: Send + Sync {
    async fn alert(&self, subject: &str, body: &str);
}

/// Fallback sink: alerts land in the log only.
pub struct LogAlerter;

#[async_trait]
impl Alerter for LogAlerter {
    async fn alert(&self, subject: &str, body: &str) {
        tracing::warn!("ALERT: {subject} — {body}");
    }
}

/// POST alerts to a webhook as a small JSON payload.
pub struct WebhookAlerter {
    http: reqwest::Client,
    url: Url,
}

impl WebhookAlerter {
    pub fn new(url: Url) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { http, url }
    }
}

#[async_trait]
impl Alerter for WebhookAlerter {
    async fn alert(&self, subject: &str, body: &str) {
        let payload = serde_json::json!({ "subject": subject, "body": body });
        match self.http.post(self.url.clone()).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!("sent alert '{subject}' to webhook");
            }
            Ok(resp) => {
                tracing::warn!("alert webhook returned {} for '{subject}'", resp.status());
            }
            Err(e) => {
                tracing::warn!("failed to deliver alert '{subject}': {e}");
            }
        }
    }
}

/// Build the configured sink: webhook when one is set and valid, log
/// otherwise.
pub fn from_config(cfg: &Config) -> Box<dyn Alerter> {
    match cfg.alert_webhook.as_deref().map(Url::parse) {
        Some(Ok(url)) => Box::new(WebhookAlerter::new(url)),
        Some(Err(e)) => {
            tracing::warn!("ALERT_WEBHOOK is not a valid URL ({e}); alerts go to the log");
            Box::new(LogAlerter)
        }
        None => Box::new(LogAlerter),
    }
}
