use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use super::threshold::ThresholdTable;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReadingError {
    #[error("reading payload must be a JSON object")]
    NotAnObject,
    #[error("reading has no device id")]
    MissingDeviceId,
    #[error("metric {metric} is not a finite number")]
    NonNumericMetric { metric: String },
    #[error("reading carries no numeric metrics")]
    NoMetrics,
}

/// One timestamped set of metric measurements from a device.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    device_id: String,
    received_at: DateTime<Utc>,
    metrics: BTreeMap<String, f64>,
}

impl Reading {
    pub fn new(
        device_id: impl Into<String>,
        received_at: DateTime<Utc>,
        metrics: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            received_at,
            metrics,
        }
    }

    /// Decodes a raw payload. Metrics named in `thresholds` must be numeric when present;
    /// other non-numeric fields are treated as metadata and dropped.
    pub fn from_payload(
        device_id: &str,
        payload: &Value,
        received_at: DateTime<Utc>,
        thresholds: &ThresholdTable,
    ) -> Result<Self, ReadingError> {
        if device_id.trim().is_empty() {
            return Err(ReadingError::MissingDeviceId);
        }

        let Value::Object(fields) = payload else {
            return Err(ReadingError::NotAnObject);
        };

        let mut metrics = BTreeMap::new();
        for (name, value) in fields {
            let number = value.as_f64().filter(|number| number.is_finite());
            match number {
                Some(number) => {
                    metrics.insert(name.clone(), number);
                }
                None if thresholds.contains(name) => {
                    return Err(ReadingError::NonNumericMetric {
                        metric: name.clone(),
                    });
                }
                None => {}
            }
        }

        if metrics.is_empty() {
            return Err(ReadingError::NoMetrics);
        }

        Ok(Self::new(device_id, received_at, metrics))
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    pub fn metrics(&self) -> impl Iterator<Item = (&str, f64)> {
        self.metrics.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

#[cfg(test)]
pub(crate) fn reading_at(device_id: &str, secs: i64, metrics: &[(&str, f64)]) -> Reading {
    use chrono::TimeZone;

    let received_at = Utc
        .timestamp_opt(secs, 0)
        .single()
        .expect("test timestamp should be valid");
    Reading::new(
        device_id,
        received_at,
        metrics
            .iter()
            .map(|(name, value)| ((*name).to_string(), *value))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::{Reading, ReadingError};
    use crate::detector::threshold::ThresholdTable;

    #[test]
    fn decodes_metrics_and_skips_metadata() {
        let payload = json!({
            "pressure": 62.5,
            "temperature": 45,
            "vibration": 0.021,
            "flow_rate": 150.0,
            "timestamp": "2025-01-01T00:00:00Z",
            "device_type": "centrifugal_pump",
            "status": "normal"
        });

        let reading = Reading::from_payload(
            "pump-01",
            &payload,
            Utc::now(),
            &ThresholdTable::default(),
        )
        .expect("payload should decode");

        assert_eq!(reading.device_id(), "pump-01");
        assert_eq!(reading.metric("temperature"), Some(45.0));
        assert_eq!(reading.metric("status"), None);
        assert_eq!(reading.metrics().count(), 4);
    }

    #[test]
    fn keeps_unknown_numeric_fields() {
        let payload = json!({ "rpm": 1480.0 });
        let reading = Reading::from_payload(
            "pump-01",
            &payload,
            Utc::now(),
            &ThresholdTable::default(),
        )
        .expect("payload should decode");
        assert_eq!(reading.metric("rpm"), Some(1480.0));
    }

    #[test]
    fn rejects_non_numeric_known_metric() {
        let payload = json!({ "pressure": "high", "temperature": 40.0 });
        let error = Reading::from_payload(
            "pump-01",
            &payload,
            Utc::now(),
            &ThresholdTable::default(),
        )
        .expect_err("string pressure must be rejected");
        assert_eq!(
            error,
            ReadingError::NonNumericMetric {
                metric: "pressure".to_string()
            }
        );
    }

    #[test]
    fn rejects_non_object_and_empty_payloads() {
        let table = ThresholdTable::default();

        assert_eq!(
            Reading::from_payload("pump-01", &json!([1, 2, 3]), Utc::now(), &table),
            Err(ReadingError::NotAnObject)
        );
        assert_eq!(
            Reading::from_payload("pump-01", &json!({ "status": "normal" }), Utc::now(), &table),
            Err(ReadingError::NoMetrics)
        );
        assert_eq!(
            Reading::from_payload("  ", &json!({ "pressure": 50.0 }), Utc::now(), &table),
            Err(ReadingError::MissingDeviceId)
        );
    }
}
