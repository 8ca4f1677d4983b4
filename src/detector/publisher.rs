use serde::Serialize;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use thiserror::Error;
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

use crate::config::PublisherConfig;

use super::alert::AlarmRecord;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to encode alarm: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write alarm: {0}")]
    Write(#[from] std::io::Error),
    #[error("telegram delivery failed: {0}")]
    Telegram(#[from] teloxide::RequestError),
    #[cfg(test)]
    #[error("mock publisher rejected alarm")]
    Rejected,
}

/// Narrow "publish one alarm record" contract. Futures are `Send` so device
/// workers can run on the multi-threaded runtime.
pub trait AlarmPublisher: Send + Sync {
    fn publish(
        &self,
        record: &AlarmRecord,
    ) -> impl Future<Output = Result<(), PublishError>> + Send;
}

#[derive(Serialize)]
struct AlarmEnvelope {
    topic: String,
    payload: serde_json::Value,
}

/// Writes one `{"topic", "payload"}` JSON line per alarm, ready for a broker bridge.
pub struct StdoutPublisher {
    out: Mutex<Stdout>,
}

impl StdoutPublisher {
    pub fn new() -> Self {
        Self {
            out: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl AlarmPublisher for StdoutPublisher {
    async fn publish(&self, record: &AlarmRecord) -> Result<(), PublishError> {
        let envelope = AlarmEnvelope {
            topic: record.topic(),
            payload: record.payload(),
        };
        let mut line = serde_json::to_vec(&envelope)?;
        line.push(b'\n');

        let mut out = self.out.lock().await;
        out.write_all(&line).await?;
        out.flush().await?;
        Ok(())
    }
}

pub struct TelegramPublisher {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramPublisher {
    pub fn new(bot_token: &str, chat_id: i64) -> Self {
        Self {
            bot: Bot::new(bot_token),
            chat_id: ChatId(chat_id),
        }
    }
}

impl AlarmPublisher for TelegramPublisher {
    async fn publish(&self, record: &AlarmRecord) -> Result<(), PublishError> {
        self.bot
            .send_message(self.chat_id, format_chat_alarm(record))
            .await?;
        Ok(())
    }
}

fn format_chat_alarm(record: &AlarmRecord) -> String {
    let icon = if record.is_critical() { "🚨" } else { "⚠️" };
    format!("{} [{}] ALARM: {}", icon, record.device_id, record.text)
}

/// Every sink enabled in the config. A failing sink is logged and does not stop the others.
pub struct ActivePublisher<S = StdoutPublisher, T = TelegramPublisher> {
    stdout: Option<S>,
    telegram: Option<T>,
}

impl ActivePublisher {
    pub fn from_config(config: &PublisherConfig) -> Self {
        let telegram = config.telegram.enabled.then(|| {
            TelegramPublisher::new(&config.telegram.bot_token, config.telegram.chat_id)
        });

        Self::with_sinks(config.stdout.then(StdoutPublisher::new), telegram)
    }
}

impl<S: AlarmPublisher, T: AlarmPublisher> ActivePublisher<S, T> {
    pub fn with_sinks(stdout: Option<S>, telegram: Option<T>) -> Self {
        Self { stdout, telegram }
    }
}

impl<S: AlarmPublisher, T: AlarmPublisher> AlarmPublisher for ActivePublisher<S, T> {
    async fn publish(&self, record: &AlarmRecord) -> Result<(), PublishError> {
        let mut first_error = None;

        if let Some(stdout) = &self.stdout
            && let Err(error) = stdout.publish(record).await
        {
            log::warn!(
                "publish_sink_failed sink=stdout alarm_type={} error={}",
                record.alarm_type,
                error
            );
            first_error.get_or_insert(error);
        }

        if let Some(telegram) = &self.telegram
            && let Err(error) = telegram.publish(record).await
        {
            log::warn!(
                "publish_sink_failed sink=telegram alarm_type={} error={}",
                record.alarm_type,
                error
            );
            first_error.get_or_insert(error);
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[derive(Default)]
pub(crate) struct MockPublisher {
    published: std::sync::Mutex<Vec<AlarmRecord>>,
    failing: bool,
    delay: Option<std::time::Duration>,
}

#[cfg(test)]
impl MockPublisher {
    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Sleeps before accepting each record, like a slow network sink.
    pub(crate) fn delayed(delay: std::time::Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub(crate) fn published(&self) -> Vec<AlarmRecord> {
        self.published
            .lock()
            .expect("mock publisher lock should not be poisoned")
            .clone()
    }
}

#[cfg(test)]
impl AlarmPublisher for MockPublisher {
    async fn publish(&self, record: &AlarmRecord) -> Result<(), PublishError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.published
            .lock()
            .expect("mock publisher lock should not be poisoned")
            .push(record.clone());

        if self.failing {
            return Err(PublishError::Rejected);
        }
        Ok(())
    }
}
