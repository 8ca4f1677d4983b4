use serde::Deserialize;

use super::alert::{Alert, AlertKind, Severity};
use super::reading::Reading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriticalDirection {
    /// Critical when value >= bound.
    #[default]
    High,
    /// Critical when value <= bound.
    Low,
}

impl CriticalDirection {
    fn is_breached(self, value: f64, bound: f64) -> bool {
        match self {
            Self::High => value >= bound,
            Self::Low => value <= bound,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetricThreshold {
    pub metric: String,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub critical: Option<f64>,
    #[serde(default)]
    pub critical_direction: CriticalDirection,
}

impl MetricThreshold {
    pub fn new(
        metric: &str,
        min: f64,
        max: f64,
        critical: f64,
        direction: CriticalDirection,
    ) -> Self {
        Self {
            metric: metric.to_string(),
            min,
            max,
            critical: Some(critical),
            critical_direction: direction,
        }
    }
}

/// Ordered, read-only threshold table. Iteration order decides alert order.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    entries: Vec<MetricThreshold>,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::new(default_thresholds())
    }
}

impl ThresholdTable {
    pub fn new(entries: Vec<MetricThreshold>) -> Self {
        Self { entries }
    }

    pub fn contains(&self, metric: &str) -> bool {
        self.entries.iter().any(|entry| entry.metric == metric)
    }

    pub fn evaluate(&self, reading: &Reading) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for threshold in &self.entries {
            let Some(value) = reading.metric(&threshold.metric) else {
                continue;
            };
            let metric = threshold.metric.as_str();

            if let Some(bound) = threshold.critical
                && threshold.critical_direction.is_breached(value, bound)
            {
                alerts.push(Alert {
                    severity: Severity::Critical,
                    kind: AlertKind::ThresholdViolation,
                    subject: Some(metric.to_string()),
                    pattern: None,
                    message: format!("CRITICAL: {} at {} (threshold: {})", metric, value, bound),
                    recommendation: format!(
                        "Immediate action required - {} critically {}",
                        metric,
                        threshold.critical_direction.describe()
                    ),
                    value: Some(value),
                    trend: None,
                });
            }

            // Independent of the critical check: one reading may yield both.
            if value > threshold.max {
                alerts.push(Alert {
                    severity: Severity::Major,
                    kind: AlertKind::ThresholdViolation,
                    subject: Some(metric.to_string()),
                    pattern: None,
                    message: format!("High {}: {} (normal max: {})", metric, value, threshold.max),
                    recommendation: format!("Monitor {} closely", metric),
                    value: Some(value),
                    trend: None,
                });
            } else if value < threshold.min {
                alerts.push(Alert {
                    severity: Severity::Minor,
                    kind: AlertKind::ThresholdViolation,
                    subject: Some(metric.to_string()),
                    pattern: None,
                    message: format!("Low {}: {} (normal min: {})", metric, value, threshold.min),
                    recommendation: format!("Check {} sensor or system", metric),
                    value: Some(value),
                    trend: None,
                });
            }
        }

        alerts
    }
}

pub fn default_thresholds() -> Vec<MetricThreshold> {
    vec![
        MetricThreshold::new("pressure", 40.0, 85.0, 95.0, CriticalDirection::High),
        MetricThreshold::new("temperature", 15.0, 70.0, 85.0, CriticalDirection::High),
        MetricThreshold::new("vibration", 0.0, 0.08, 0.15, CriticalDirection::High),
        MetricThreshold::new("flow_rate", 100.0, 200.0, 50.0, CriticalDirection::Low),
    ]
}
