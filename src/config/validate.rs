use std::collections::HashSet;

use thiserror::Error;

use super::schema::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Validation(String),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let detector = &self.detector;
        if detector.history_capacity == 0 {
            return Err(ConfigError::Validation(
                "detector.history_capacity must be greater than 0".to_string(),
            ));
        }
        validate_window(
            "detector.trend",
            detector.trend_window,
            detector.trend_min_readings,
            detector.history_capacity,
        )?;
        validate_window(
            "detector.pattern",
            detector.pattern_window,
            detector.pattern_min_readings,
            detector.history_capacity,
        )?;
        if detector.cooldown_secs == 0 {
            return Err(ConfigError::Validation(
                "detector.cooldown_secs must be greater than 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for threshold in &self.thresholds {
            let metric = threshold.metric.as_str();
            if metric.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "thresholds.metric must not be empty".to_string(),
                ));
            }
            if !seen.insert(metric) {
                return Err(ConfigError::Validation(format!(
                    "thresholds.{} is defined more than once",
                    metric
                )));
            }
            validate_finite(&format!("thresholds.{}.min", metric), threshold.min)?;
            validate_finite(&format!("thresholds.{}.max", metric), threshold.max)?;
            if let Some(critical) = threshold.critical {
                validate_finite(&format!("thresholds.{}.critical", metric), critical)?;
            }
            if threshold.min > threshold.max {
                return Err(ConfigError::Validation(format!(
                    "thresholds.{}.min must not exceed max",
                    metric
                )));
            }
        }

        for trend in &self.trends {
            if trend.metric.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "trends.metric must not be empty".to_string(),
                ));
            }
            if !trend.max_rate.is_finite() || trend.max_rate <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "trends.{}.max_rate must be a positive number",
                    trend.metric
                )));
            }
        }

        for pattern in &self.patterns {
            if pattern.name.trim().is_empty() || pattern.subject.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "patterns.name and patterns.subject must not be empty".to_string(),
                ));
            }
            if pattern.conditions.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "patterns.{} needs at least one condition",
                    pattern.name
                )));
            }
            for condition in &pattern.conditions {
                validate_finite(
                    &format!("patterns.{}.{}", pattern.name, condition.metric),
                    condition.bound,
                )?;
            }
        }

        let telegram = &self.publisher.telegram;
        if telegram.enabled && telegram.bot_token.trim().is_empty() {
            return Err(ConfigError::Validation(
                "publisher.telegram.bot_token must not be empty when publisher.telegram.enabled is true"
                    .to_string(),
            ));
        }
        if telegram.enabled && telegram.chat_id == 0 {
            return Err(ConfigError::Validation(
                "publisher.telegram.chat_id must be set when publisher.telegram.enabled is true"
                    .to_string(),
            ));
        }
        if !self.publisher.stdout && !telegram.enabled {
            return Err(ConfigError::Validation(
                "at least one publisher must be enabled".to_string(),
            ));
        }

        if self.ingest.topic_prefix.trim().is_empty() {
            return Err(ConfigError::Validation(
                "ingest.topic_prefix must not be empty".to_string(),
            ));
        }
        if self.ingest.worker_queue == 0 {
            return Err(ConfigError::Validation(
                "ingest.worker_queue must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_window(
    field: &str,
    window: usize,
    min_readings: usize,
    capacity: usize,
) -> Result<(), ConfigError> {
    if min_readings == 0 {
        return Err(ConfigError::Validation(format!(
            "{}_min_readings must be greater than 0",
            field
        )));
    }
    if min_readings > window {
        return Err(ConfigError::Validation(format!(
            "{}_min_readings must not exceed {}_window",
            field, field
        )));
    }
    if window > capacity {
        return Err(ConfigError::Validation(format!(
            "{}_window must not exceed detector.history_capacity",
            field
        )));
    }
    Ok(())
}

fn validate_finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::Validation(format!(
            "{} must be a finite number",
            field
        )));
    }
    Ok(())
}
