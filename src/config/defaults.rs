use crate::detector::{
    DEFAULT_COOLDOWN_SECS, DEFAULT_HISTORY_CAPACITY, DEFAULT_PATTERN_MIN_READINGS,
    DEFAULT_PATTERN_WINDOW, DEFAULT_TREND_MIN_READINGS, DEFAULT_TREND_WINDOW, MetricThreshold,
    PatternRule, TrendRule, default_pattern_rules, default_thresholds, default_trend_rules,
};

use super::schema::{Config, DetectorConfig, IngestConfig, PublisherConfig};

pub(super) fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

pub(super) fn default_trend_window() -> usize {
    DEFAULT_TREND_WINDOW
}

pub(super) fn default_trend_min_readings() -> usize {
    DEFAULT_TREND_MIN_READINGS
}

pub(super) fn default_pattern_window() -> usize {
    DEFAULT_PATTERN_WINDOW
}

pub(super) fn default_pattern_min_readings() -> usize {
    DEFAULT_PATTERN_MIN_READINGS
}

pub(super) fn default_cooldown_secs() -> u64 {
    DEFAULT_COOLDOWN_SECS
}

pub(super) fn default_threshold_table() -> Vec<MetricThreshold> {
    default_thresholds()
}

pub(super) fn default_trend_table() -> Vec<TrendRule> {
    default_trend_rules()
}

pub(super) fn default_pattern_table() -> Vec<PatternRule> {
    default_pattern_rules()
}

pub(super) fn default_stdout_enabled() -> bool {
    true
}

pub(super) fn default_topic_prefix() -> String {
    "te/device/".to_string()
}

pub(super) fn default_worker_queue() -> usize {
    64
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            trend_window: default_trend_window(),
            trend_min_readings: default_trend_min_readings(),
            pattern_window: default_pattern_window(),
            pattern_min_readings: default_pattern_min_readings(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            stdout: default_stdout_enabled(),
            telegram: Default::default(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            topic_prefix: default_topic_prefix(),
            worker_queue: default_worker_queue(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            thresholds: default_threshold_table(),
            trends: default_trend_table(),
            patterns: default_pattern_table(),
            publisher: PublisherConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}
