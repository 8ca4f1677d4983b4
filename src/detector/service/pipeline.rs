use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::Config;

use super::super::{
    alert::{AlarmRecord, Alert},
    dedup::AlarmDeduplicator,
    history::HistoryStore,
    pattern::PatternEvaluator,
    publisher::AlarmPublisher,
    reading::{Reading, ReadingError},
    threshold::ThresholdTable,
    trend::TrendEvaluator,
};
use super::snapshot::DetectorCounters;

/// What one reading produced: every candidate alert and the alarms that survived cooldown.
#[derive(Debug, Clone, Default)]
pub struct ReadingOutcome {
    pub alerts: Vec<Alert>,
    pub published: Vec<AlarmRecord>,
}

pub struct Detector<P> {
    thresholds: ThresholdTable,
    trends: TrendEvaluator,
    patterns: PatternEvaluator,
    pub(super) history: HistoryStore,
    dedup: Mutex<AlarmDeduplicator>,
    pub(super) counters: Mutex<DetectorCounters>,
    pub(super) publisher: P,
}

impl<P: AlarmPublisher> Detector<P> {
    pub fn new(
        thresholds: ThresholdTable,
        trends: TrendEvaluator,
        patterns: PatternEvaluator,
        history: HistoryStore,
        dedup: AlarmDeduplicator,
        publisher: P,
    ) -> Self {
        Self {
            thresholds,
            trends,
            patterns,
            history,
            dedup: Mutex::new(dedup),
            counters: Mutex::new(DetectorCounters::default()),
            publisher,
        }
    }

    pub fn from_config(config: &Config, publisher: P) -> Self {
        let settings = &config.detector;
        Self::new(
            ThresholdTable::new(config.thresholds.clone()),
            TrendEvaluator::new(
                config.trends.clone(),
                settings.trend_window,
                settings.trend_min_readings,
            ),
            PatternEvaluator::new(
                config.patterns.clone(),
                settings.pattern_window,
                settings.pattern_min_readings,
            ),
            HistoryStore::with_capacity(settings.history_capacity),
            AlarmDeduplicator::new(settings.cooldown_secs),
            publisher,
        )
    }

    /// Runs one reading through record, evaluate, dedup and publish. Readings for
    /// the same device are serialized on that device's history lock, which is
    /// released before any sink is contacted.
    pub async fn on_reading(
        &self,
        device_id: &str,
        payload: &Value,
        received_at: DateTime<Utc>,
    ) -> Result<ReadingOutcome, ReadingError> {
        let reading =
            match Reading::from_payload(device_id, payload, received_at, &self.thresholds) {
                Ok(reading) => reading,
                Err(error) => {
                    self.counters.lock().await.malformed_readings += 1;
                    log::warn!(
                        "reading_dropped device_id={} reason={}",
                        device_id,
                        error
                    );
                    return Err(error);
                }
            };

        let (alerts, admitted, history_len) = {
            let window = self.history.window(device_id).await;
            let mut window = window.lock().await;
            window.push(reading.clone());

            let history = window.recent(usize::MAX);
            let mut alerts = self.thresholds.evaluate(&reading);
            alerts.extend(self.trends.evaluate(device_id, &history, &reading));
            alerts.extend(self.patterns.evaluate(device_id, &history, &reading));

            let admitted: Vec<AlarmRecord> = {
                let mut dedup = self.dedup.lock().await;
                alerts
                    .iter()
                    .filter(|alert| dedup.admit(alert, device_id, received_at))
                    .map(|alert| AlarmRecord::from_alert(device_id, alert))
                    .collect()
            };
            (alerts, admitted, window.len())
        };
        let suppressed = alerts.len() - admitted.len();

        tracing::info!(
            target: "detector",
            module = "detector",
            device_id = device_id,
            history_len = history_len,
            alerts = alerts.len(),
            admitted = admitted.len(),
            suppressed = suppressed,
            "reading_evaluated"
        );

        // Cooldown is already recorded; a failed publish is reported by the sink, not retried.
        for record in &admitted {
            match self.publisher.publish(record).await {
                Ok(()) => log::info!(
                    "alarm_published device_id={} alarm_type={} severity={} text={}",
                    record.device_id,
                    record.alarm_type,
                    record.severity,
                    record.text
                ),
                Err(error) => log::debug!(
                    "alarm_publish_failed device_id={} alarm_type={} error={}",
                    record.device_id,
                    record.alarm_type,
                    error
                ),
            }
        }

        {
            let mut counters = self.counters.lock().await;
            counters.readings_seen += 1;
            counters.alarms_published += admitted.len() as u64;
            counters.alarms_suppressed += suppressed as u64;
        }

        Ok(ReadingOutcome {
            alerts,
            published: admitted,
        })
    }

    pub async fn recent_readings(&self, device_id: &str, n: usize) -> Vec<Reading> {
        self.history.recent(device_id, n).await
    }
}
