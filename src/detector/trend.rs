use serde::Deserialize;

use super::alert::{Alert, AlertKind, Severity};
use super::reading::Reading;

pub const DEFAULT_TREND_WINDOW: usize = 10;
pub const DEFAULT_TREND_MIN_READINGS: usize = 5;

/// Flags a metric rising faster than `max_rate` units per reading.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrendRule {
    pub metric: String,
    pub label: String,
    pub unit: String,
    pub max_rate: f64,
    pub recommendation: String,
}

pub fn default_trend_rules() -> Vec<TrendRule> {
    vec![
        TrendRule {
            metric: "pressure".to_string(),
            label: "Pressure".to_string(),
            unit: "PSI".to_string(),
            max_rate: 2.0,
            recommendation: "Investigate cause of pressure increase".to_string(),
        },
        TrendRule {
            metric: "temperature".to_string(),
            label: "Temperature".to_string(),
            unit: "°C".to_string(),
            max_rate: 1.5,
            recommendation: "Check cooling system".to_string(),
        },
    ]
}

#[derive(Debug, Clone)]
pub struct TrendEvaluator {
    rules: Vec<TrendRule>,
    window: usize,
    min_readings: usize,
}

impl TrendEvaluator {
    pub fn new(rules: Vec<TrendRule>, window: usize, min_readings: usize) -> Self {
        Self {
            rules,
            window,
            min_readings: min_readings.max(1),
        }
    }

    /// `history` is the device's window with `current` already appended, most recent last.
    pub fn evaluate(&self, device_id: &str, history: &[&Reading], current: &Reading) -> Vec<Alert> {
        let skip = history.len().saturating_sub(self.window);
        let recent: Vec<&Reading> = history
            .iter()
            .skip(skip)
            .copied()
            .filter(|reading| reading.device_id() == device_id)
            .collect();

        if recent.len() < self.min_readings {
            return Vec::new();
        }

        let mut alerts = Vec::new();
        for rule in &self.rules {
            let Some(rate) = rate_of_change(&recent, &rule.metric) else {
                continue;
            };
            if rate <= rule.max_rate {
                continue;
            }

            alerts.push(Alert {
                severity: Severity::Major,
                kind: AlertKind::TrendAnomaly,
                subject: Some(rule.metric.clone()),
                pattern: None,
                message: format!(
                    "{} rising rapidly: +{:.2} {} per reading",
                    rule.label, rate, rule.unit
                ),
                recommendation: rule.recommendation.clone(),
                value: current.metric(&rule.metric),
                trend: Some(format!("+{:.2} {}/reading", rate, rule.unit)),
            });
        }

        alerts
    }
}

impl Default for TrendEvaluator {
    fn default() -> Self {
        Self::new(
            default_trend_rules(),
            DEFAULT_TREND_WINDOW,
            DEFAULT_TREND_MIN_READINGS,
        )
    }
}

/// (newest - oldest) / count, only when every reading carries the metric.
fn rate_of_change(readings: &[&Reading], metric: &str) -> Option<f64> {
    let values: Option<Vec<f64>> = readings.iter().map(|reading| reading.metric(metric)).collect();
    let values = values?;
    let (first, last) = (values.first()?, values.last()?);
    Some((last - first) / values.len() as f64)
}
