mod alert;
mod dedup;
mod history;
mod pattern;
mod publisher;
mod reading;
mod service;
mod threshold;
mod trend;

pub use alert::{AlarmIdentity, AlarmRecord, Alert, AlertKind, Severity};
pub use dedup::{AlarmDeduplicator, DEFAULT_COOLDOWN_SECS};
pub use history::{DEFAULT_HISTORY_CAPACITY, HistoryStore, HistoryWindow};
pub use pattern::{
    Comparison, DEFAULT_PATTERN_MIN_READINGS, DEFAULT_PATTERN_WINDOW, MetricCondition,
    PatternEvaluator, PatternRule, PatternScope, default_pattern_rules,
};
pub use publisher::{
    ActivePublisher, AlarmPublisher, PublishError, StdoutPublisher, TelegramPublisher,
};
pub use reading::{Reading, ReadingError};
#[cfg(test)]
pub(crate) use publisher::MockPublisher;
pub use service::{Detector, DetectorSnapshot, ReadingOutcome};
pub use threshold::{CriticalDirection, MetricThreshold, ThresholdTable, default_thresholds};
pub use trend::{
    DEFAULT_TREND_MIN_READINGS, DEFAULT_TREND_WINDOW, TrendEvaluator, TrendRule,
    default_trend_rules,
};
