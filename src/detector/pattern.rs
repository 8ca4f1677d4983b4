use serde::Deserialize;

use super::alert::{Alert, AlertKind, Severity};
use super::reading::Reading;

pub const DEFAULT_PATTERN_WINDOW: usize = 5;
pub const DEFAULT_PATTERN_MIN_READINGS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternScope {
    /// Every reading in the window must match.
    Window,
    /// Only the reading being evaluated must match.
    Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Above,
    Below,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MetricCondition {
    pub metric: String,
    pub comparison: Comparison,
    pub bound: f64,
}

impl MetricCondition {
    fn new(metric: &str, comparison: Comparison, bound: f64) -> Self {
        Self {
            metric: metric.to_string(),
            comparison,
            bound,
        }
    }

    // A missing metric never matches.
    fn matches(&self, reading: &Reading) -> bool {
        match (reading.metric(&self.metric), self.comparison) {
            (Some(value), Comparison::Above) => value > self.bound,
            (Some(value), Comparison::Below) => value < self.bound,
            (None, _) => false,
        }
    }
}

/// Named failure signature: a set of conditions plus the alert it raises.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PatternRule {
    pub name: String,
    pub subject: String,
    pub severity: Severity,
    pub scope: PatternScope,
    pub conditions: Vec<MetricCondition>,
    pub message: String,
    pub recommendation: String,
}

impl PatternRule {
    fn matches_reading(&self, reading: &Reading) -> bool {
        self.conditions.iter().all(|condition| condition.matches(reading))
    }

    fn matches(&self, window: &[&Reading], current: &Reading) -> bool {
        match self.scope {
            PatternScope::Window => window.iter().all(|reading| self.matches_reading(reading)),
            PatternScope::Current => self.matches_reading(current),
        }
    }

    fn to_alert(&self) -> Alert {
        Alert {
            severity: self.severity,
            kind: AlertKind::PatternDetected,
            subject: Some(self.subject.clone()),
            pattern: Some(self.name.clone()),
            message: self.message.clone(),
            recommendation: self.recommendation.clone(),
            value: None,
            trend: None,
        }
    }
}

pub fn default_pattern_rules() -> Vec<PatternRule> {
    vec![
        PatternRule {
            name: "bearing_failure".to_string(),
            subject: "bearing".to_string(),
            severity: Severity::Critical,
            scope: PatternScope::Window,
            conditions: vec![
                MetricCondition::new("temperature", Comparison::Above, 65.0),
                MetricCondition::new("vibration", Comparison::Above, 0.08),
            ],
            message: "Bearing failure pattern detected (sustained high temp + vibration)"
                .to_string(),
            recommendation: "Schedule immediate bearing inspection".to_string(),
        },
        PatternRule {
            name: "possible_blockage".to_string(),
            subject: "blockage".to_string(),
            severity: Severity::Major,
            scope: PatternScope::Current,
            conditions: vec![
                MetricCondition::new("flow_rate", Comparison::Below, 120.0),
                MetricCondition::new("pressure", Comparison::Above, 75.0),
            ],
            message: "High pressure with low flow rate - possible blockage".to_string(),
            recommendation: "Check for obstructions in system".to_string(),
        },
    ]
}

#[derive(Debug, Clone)]
pub struct PatternEvaluator {
    rules: Vec<PatternRule>,
    window: usize,
    min_readings: usize,
}

impl PatternEvaluator {
    pub fn new(rules: Vec<PatternRule>, window: usize, min_readings: usize) -> Self {
        Self {
            rules,
            window,
            min_readings: min_readings.max(1),
        }
    }

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

        self.rules
            .iter()
            .filter(|rule| rule.matches(&recent, current))
            .map(PatternRule::to_alert)
            .collect()
    }
}

impl Default for PatternEvaluator {
    fn default() -> Self {
        Self::new(
            default_pattern_rules(),
            DEFAULT_PATTERN_WINDOW,
            DEFAULT_PATTERN_MIN_READINGS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Comparison, MetricCondition, PatternEvaluator, PatternRule, PatternScope};
    use crate::detector::alert::{Alert, Severity};
    use crate::detector::reading::{Reading, reading_at};

    fn hot_and_shaking(tick: i64, temperature: f64) -> Reading {
        reading_at(
            "pump-01",
            tick,
            &[
                ("temperature", temperature),
                ("vibration", 0.12),
                ("pressure", 60.0),
                ("flow_rate", 150.0),
            ],
        )
    }

    fn evaluate(evaluator: &PatternEvaluator, readings: &[Reading]) -> Vec<Alert> {
        let history: Vec<&Reading> = readings.iter().collect();
        let current = readings.last().expect("readings should not be empty");
        evaluator.evaluate("pump-01", &history, current)
    }

    fn pattern_names(alerts: &[Alert]) -> Vec<&str> {
        alerts
            .iter()
            .filter_map(|alert| alert.pattern.as_deref())
            .collect()
    }

    #[test]
    fn sustained_heat_and_vibration_is_bearing_failure() {
        let readings: Vec<_> = (0..3).map(|tick| hot_and_shaking(tick, 70.0)).collect();
        let alerts = evaluate(&PatternEvaluator::default(), &readings);

        assert_eq!(pattern_names(&alerts), vec!["bearing_failure"]);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[0].subject.as_deref(), Some("bearing"));
    }

    #[test]
    fn one_cool_reading_suppresses_bearing_failure() {
        let readings = vec![
            hot_and_shaking(0, 70.0),
            hot_and_shaking(1, 64.0),
            hot_and_shaking(2, 70.0),
            hot_and_shaking(3, 71.0),
        ];
        assert!(evaluate(&PatternEvaluator::default(), &readings).is_empty());
    }

    #[test]
    fn cool_reading_outside_the_window_is_forgotten() {
        let mut readings = vec![hot_and_shaking(0, 60.0)];
        readings.extend((1..6).map(|tick| hot_and_shaking(tick, 70.0)));
        let alerts = evaluate(&PatternEvaluator::default(), &readings);
        assert_eq!(pattern_names(&alerts), vec!["bearing_failure"]);
    }

    #[test]
    fn needs_minimum_history() {
        let readings: Vec<_> = (0..2).map(|tick| hot_and_shaking(tick, 90.0)).collect();
        assert!(evaluate(&PatternEvaluator::default(), &readings).is_empty());
    }

    #[test]
    fn blockage_looks_at_current_reading_only() {
        let mut readings: Vec<_> = (0..3)
            .map(|tick| reading_at("pump-01", tick, &[("pressure", 60.0), ("flow_rate", 150.0)]))
            .collect();
        readings.push(reading_at(
            "pump-01",
            3,
            &[("pressure", 80.0), ("flow_rate", 110.0)],
        ));

        let alerts = evaluate(&PatternEvaluator::default(), &readings);
        assert_eq!(pattern_names(&alerts), vec!["possible_blockage"]);
        assert_eq!(alerts[0].severity, Severity::Major);
        assert_eq!(alerts[0].subject.as_deref(), Some("blockage"));
    }

    #[test]
    fn both_signatures_can_fire_together() {
        let readings: Vec<_> = (0..3)
            .map(|tick| {
                reading_at(
                    "pump-01",
                    tick,
                    &[
                        ("temperature", 75.0),
                        ("vibration", 0.1),
                        ("pressure", 80.0),
                        ("flow_rate", 100.0),
                    ],
                )
            })
            .collect();
        let alerts = evaluate(&PatternEvaluator::default(), &readings);
        assert_eq!(
            pattern_names(&alerts),
            vec!["bearing_failure", "possible_blockage"]
        );
    }

    #[test]
    fn new_signatures_are_added_as_data() {
        let cavitation = PatternRule {
            name: "cavitation".to_string(),
            subject: "impeller".to_string(),
            severity: Severity::Warning,
            scope: PatternScope::Window,
            conditions: vec![MetricCondition {
                metric: "vibration".to_string(),
                comparison: Comparison::Above,
                bound: 0.1,
            }],
            message: "Cavitation suspected".to_string(),
            recommendation: "Check suction pressure".to_string(),
        };
        let evaluator = PatternEvaluator::new(vec![cavitation], 5, 3);
        let readings: Vec<_> = (0..3).map(|tick| hot_and_shaking(tick, 20.0)).collect();

        let alerts = evaluate(&evaluator, &readings);
        assert_eq!(pattern_names(&alerts), vec!["cavitation"]);
        assert_eq!(alerts[0].severity, Severity::Warning);
    }
}
