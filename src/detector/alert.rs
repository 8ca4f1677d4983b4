use serde::{Deserialize, Serialize};
use serde_json::json;

const GENERAL_SUBJECT: &str = "general";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Major,
    Minor,
    Warning,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Major => "MAJOR",
            Self::Minor => "MINOR",
            Self::Warning => "WARNING",
        }
    }

    /// Parses a lowercase severity name; anything unrecognised maps to `Major`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "minor" => Self::Minor,
            "warning" => Self::Warning,
            _ => Self::Major,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    ThresholdViolation,
    TrendAnomaly,
    PatternDetected,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThresholdViolation => "threshold_violation",
            Self::TrendAnomaly => "trend_anomaly",
            Self::PatternDetected => "pattern_detected",
        }
    }
}

/// Candidate anomaly produced by an evaluator, before cooldown filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub severity: Severity,
    pub kind: AlertKind,
    /// Metric name for threshold/trend alerts, alarm subject for patterns.
    pub subject: Option<String>,
    pub pattern: Option<String>,
    pub message: String,
    pub recommendation: String,
    pub value: Option<f64>,
    pub trend: Option<String>,
}

impl Alert {
    pub fn subject_or_general(&self) -> &str {
        self.subject.as_deref().unwrap_or(GENERAL_SUBJECT)
    }

    pub fn identity(&self, device_id: &str) -> AlarmIdentity {
        AlarmIdentity {
            device_id: device_id.to_string(),
            kind: self.kind,
            subject: self.subject_or_general().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlarmIdentity {
    pub device_id: String,
    pub kind: AlertKind,
    pub subject: String,
}

/// Published form of an alert. `alarm_type` is stable per identity so downstream
/// alarm managers fold repeats into one alarm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlarmRecord {
    pub device_id: String,
    pub alarm_type: String,
    pub severity: &'static str,
    pub text: String,
}

impl AlarmRecord {
    pub fn from_alert(device_id: &str, alert: &Alert) -> Self {
        Self {
            device_id: device_id.to_string(),
            alarm_type: format!("ai_{}_{}", alert.kind.as_str(), alert.subject_or_general()),
            severity: alert.severity.label(),
            text: alert.message.clone(),
        }
    }

    pub fn topic(&self) -> String {
        format!("te/device/{}///a/{}", self.device_id, self.alarm_type)
    }

    pub fn payload(&self) -> serde_json::Value {
        json!({
            "text": self.text,
            "severity": self.severity,
        })
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical.label()
    }
}
