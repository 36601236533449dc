//! Alerting layer for tracing.
//!
//! Events at or above the configured level are queued to a background task
//! that forwards them to stderr or a chat webhook. Repeats of the same event
//! inside the cooldown are folded into a count carried by the next alert, so
//! an unreachable store does not page once per garden request.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{Event, Subscriber};
use tracing_subscriber::{Layer, layer::Context};

#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub level: String,
    pub message: String,
    pub target: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub fields: Vec<(String, String)>,
    /// Identical events dropped by the cooldown since the previous alert.
    pub suppressed: u32,
}

impl AlertMessage {
    fn key(&self) -> String {
        format!("{}|{}", self.target, self.message)
    }

    /// Plain-text body shared by every sender.
    pub fn render(&self) -> String {
        let mut text = format!(
            "{} in {} at {}: {}",
            self.level,
            self.target,
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.message
        );
        for (name, value) in &self.fields {
            let _ = write!(text, "\n  {name} = {value}");
        }
        if self.suppressed > 0 {
            let _ = write!(text, "\n  (+{} similar since last alert)", self.suppressed);
        }
        text
    }
}

#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Least severe level that triggers an alert.
    pub min_level: tracing::Level,
    /// Alerts queued beyond this are dropped.
    pub buffer_size: usize,
    /// Minimum gap between two alerts for the same target and message.
    pub cooldown: Duration,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            min_level: tracing::Level::ERROR,
            buffer_size: 100,
            cooldown: Duration::from_secs(60),
        }
    }
}

#[async_trait::async_trait]
pub trait AlertSender: Send + Sync {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Failed to send alert: {0}")]
    SendError(String),
}

pub struct ConsoleAlertSender;

#[async_trait::async_trait]
impl AlertSender for ConsoleAlertSender {
    async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
        eprintln!("[typelab alert] {}", alert.render());
        Ok(())
    }
}

/// Posts `{"text": ...}` to a Slack/Discord-style webhook.
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
            .and_then(|res| res.error_for_status())
            .map_err(|e| AlertError::SendError(e.to_string()))?;

        Ok(())
    }
}

/// Per-key cooldown bookkeeping, owned by the forwarding task.
struct Throttle {
    cooldown: Duration,
    seen: HashMap<String, (Instant, u32)>,
}

impl Throttle {
    fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            seen: HashMap::new(),
        }
    }

    /// `Some(suppressed)` when the alert should go out now, `None` when it is
    /// folded into the next one.
    fn admit(&mut self, key: String, now: Instant) -> Option<u32> {
        match self.seen.get_mut(&key) {
            Some((last_sent, suppressed)) if now.duration_since(*last_sent) < self.cooldown => {
                *suppressed += 1;
                None
            }
            Some((last_sent, suppressed)) => {
                let folded = *suppressed;
                *last_sent = now;
                *suppressed = 0;
                Some(folded)
            }
            None => {
                self.seen.insert(key, (now, 0));
                Some(0)
            }
        }
    }
}

/// Tracing layer that queues an alert for every qualifying event.
pub struct AlertLayer {
    sender: mpsc::Sender<AlertMessage>,
    min_level: tracing::Level,
}

impl AlertLayer {
    /// Must be called inside a tokio runtime.
    pub fn new(alert_sender: Arc<dyn AlertSender>, config: AlertConfig) -> Self {
        let (tx, mut rx) = mpsc::channel::<AlertMessage>(config.buffer_size.max(1));
        let mut throttle = Throttle::new(config.cooldown);

        tokio::spawn(async move {
            while let Some(mut alert) = rx.recv().await {
                let Some(suppressed) = throttle.admit(alert.key(), Instant::now()) else {
                    continue;
                };
                alert.suppressed = suppressed;
                if let Err(e) = alert_sender.send(alert).await {
                    eprintln!("Failed to send alert: {}", e);
                }
            }
        });

        Self {
            sender: tx,
            min_level: config.min_level,
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

impl FieldVisitor {
    fn push(&mut self, field: &tracing::field::Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.push(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.push(field, value.to_string());
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        // ERROR is the smallest level.
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
            suppressed: 0,
        };

        // Never block the logging call site.
        let _ = self.sender.try_send(alert);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tracing_subscriber::layer::SubscriberExt;

    struct ChannelSender(mpsc::UnboundedSender<AlertMessage>);

    #[async_trait::async_trait]
    impl AlertSender for ChannelSender {
        async fn send(&self, alert: AlertMessage) -> Result<(), AlertError> {
            self.0
                .send(alert)
                .map_err(|e| AlertError::SendError(e.to_string()))
        }
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<AlertMessage>) -> AlertMessage {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_only_errors_are_forwarded() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let layer = AlertLayer::new(Arc::new(ChannelSender(tx)), AlertConfig::default());
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("just a warning");
            tracing::error!(post_count = 3, "garden build failed");
        });

        let alert = next(&mut rx).await;
        assert_eq!(alert.level, "ERROR");
        assert_eq!(alert.message, "garden build failed");
        assert!(alert.fields.contains(&("post_count".to_string(), "3".to_string())));
        assert_eq!(alert.suppressed, 0);

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_repeated_error_is_sent_once_within_cooldown() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let layer = AlertLayer::new(Arc::new(ChannelSender(tx)), AlertConfig::default());
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            for _ in 0..3 {
                tracing::error!("post store unreachable");
            }
            tracing::error!("media root missing");
        });

        assert_eq!(next(&mut rx).await.message, "post store unreachable");
        assert_eq!(next(&mut rx).await.message, "media root missing");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_throttle_folds_repeats_into_next_alert() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_secs(60));
        let key = || "typelab_core::feed|Garden load failed".to_string();

        assert_eq!(throttle.admit(key(), start), Some(0));
        assert_eq!(throttle.admit(key(), start + Duration::from_secs(10)), None);
        assert_eq!(throttle.admit(key(), start + Duration::from_secs(20)), None);
        assert_eq!(throttle.admit(key(), start + Duration::from_secs(61)), Some(2));
        assert_eq!(throttle.admit(key(), start + Duration::from_secs(62)), None);
        assert_eq!(throttle.admit("other|x".to_string(), start), Some(0));
    }

    #[test]
    fn test_render_lists_fields_and_repeats() {
        let alert = AlertMessage {
            level: "ERROR".to_string(),
            message: "Garden load failed".to_string(),
            target: "typelab_core::feed".to_string(),
            timestamp: chrono::Utc.with_ymd_and_hms(2025, 11, 3, 1, 2, 3).unwrap(),
            fields: vec![("error".to_string(), "timeout".to_string())],
            suppressed: 4,
        };

        assert_eq!(
            alert.render(),
            "ERROR in typelab_core::feed at 2025-11-03 01:02:03 UTC: Garden load failed\n  \
             error = timeout\n  (+4 similar since last alert)"
        );
    }
}
