//! Alerting layer for tracing.
//!
//! Forwards events at or above a configured level (ERROR by default) to an
//! alert channel. Failed scheduler jobs and storage outages log at ERROR, so
//! they reach the on-call channel with their job id and reason attached.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{Layer, layer::Context};

/// Alert message containing event details.
#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub level: String,
    pub message: String,
    pub target: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub fields: Vec<(String, String)>,
}

impl AlertMessage {
    /// Plain-text rendering used by chat webhooks.
    pub fn render(&self) -> String {
        let mut text = format!(
            "*{}* {}\n*Target:* {}\n*Time:* {}",
            self.level,
            self.message,
            self.target,
            self.timestamp.to_rfc3339()
        );
        for (name, value) in &self.fields {
            text.push_str(&format!("\n*{name}:* {value}"));
        }
        text
    }
}

/// Configuration for the alert layer.
#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Least severe level that triggers an alert.
    pub min_level: Level,
    /// Alerts buffered before new ones are dropped.
    pub buffer_size: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            min_level: Level::ERROR,
            buffer_size: 100,
        }
    }
}

/// Alert delivery backend.
#[async_trait::async_trait]
pub trait AlertSender: Send + Sync {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Failed to send alert: {0}")]
    SendError(String),
}

/// Writes alerts to stderr (for development).
pub struct ConsoleAlertSender;

#[async_trait::async_trait]
impl AlertSender for ConsoleAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        eprintln!("\n[ALERT]\n{}\n", alert.render());
        Ok(())
    }
}

/// Posts alerts to a webhook URL (Slack, Discord, etc.).
pub struct WebhookAlertSender {
    url: String,
    client: reqwest::Client,
}

impl WebhookAlertSender {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl AlertSender for WebhookAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        let payload = serde_json::json!({ "text": alert.render() });

        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AlertError::SendError(e.to_string()))?;

        Ok(())
    }
}

/// Tracing layer that forwards severe events to an [`AlertSender`].
pub struct AlertLayer {
    min_level: Level,
    sender: mpsc::Sender<AlertMessage>,
}

impl AlertLayer {
    /// Must be called inside a Tokio runtime: delivery runs on a spawned task.
    pub fn new(alert_sender: Arc<dyn AlertSender>, config: AlertConfig) -> Self {
        let (tx, mut rx) = mpsc::channel::<AlertMessage>(config.buffer_size.max(1));

        tokio::spawn(async move {
            while let Some(alert) = rx.recv().await {
                // Not traced: an ERROR here would loop back into this layer.
                if let Err(e) = alert_sender.send(alert).await {
                    eprintln!("Failed to send alert: {e}");
                }
            }
        });

        Self {
            min_level: config.min_level,
            sender: tx,
        }
    }

    pub fn console(config: AlertConfig) -> Self {
        Self::new(Arc::new(ConsoleAlertSender), config)
    }

    pub fn webhook(url: String, config: AlertConfig) -> Self {
        Self::new(Arc::new(WebhookAlertSender::new(url)), config)
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields
                .push((field.name().to_string(), format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // Lower levels are more severe.
        if *event.metadata().level() > self.min_level {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let alert = AlertMessage {
            level: event.metadata().level().to_string(),
            message: visitor.message,
            target: event.metadata().target().to_string(),
            timestamp: chrono::Utc::now(),
            fields: visitor.fields,
        };

        // Dropped when the buffer is full.
        let _ = self.sender.try_send(alert);
    }
}
