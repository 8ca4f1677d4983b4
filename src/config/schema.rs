use serde::Deserialize;

use crate::detector::{MetricThreshold, PatternRule, TrendRule};

use super::defaults::*;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default = "default_threshold_table")]
    pub thresholds: Vec<MetricThreshold>,
    #[serde(default = "default_trend_table")]
    pub trends: Vec<TrendRule>,
    #[serde(default = "default_pattern_table")]
    pub patterns: Vec<PatternRule>,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_trend_window")]
    pub trend_window: usize,
    #[serde(default = "default_trend_min_readings")]
    pub trend_min_readings: usize,
    #[serde(default = "default_pattern_window")]
    pub pattern_window: usize,
    #[serde(default = "default_pattern_min_readings")]
    pub pattern_min_readings: usize,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublisherConfig {
    #[serde(default = "default_stdout_enabled")]
    pub stdout: bool,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
    #[serde(default = "default_worker_queue")]
    pub worker_queue: usize,
}
