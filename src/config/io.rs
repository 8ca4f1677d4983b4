use std::path::{Path, PathBuf};

use super::{schema::Config, validate::ConfigError};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const CONFIG_PATH_ENV: &str = "ANOMALY_DETECTOR_CONFIG";

pub fn config_path_from_env() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let path_str = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_str.clone(),
        source,
    })?;
    let config: Config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path_str,
        source,
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::load_config;
    use crate::config::{Config, ConfigError};
    use crate::detector::{CriticalDirection, PatternScope, Severity};

    #[test]
    fn empty_file_yields_builtin_tables() {
        let temp = tempdir().expect("tempdir should be created");
        let path = temp.path().join("config.toml");
        fs::write(&path, "").expect("config should be written");

        let config = load_config(&path).expect("empty config should load");
        assert_eq!(config.detector.history_capacity, 20);
        assert_eq!(config.detector.cooldown_secs, 10);
        assert_eq!(config.thresholds.len(), 4);
        assert_eq!(config.thresholds[3].metric, "flow_rate");
        assert_eq!(config.thresholds[3].critical_direction, CriticalDirection::Low);
        assert_eq!(config.trends.len(), 2);
        assert_eq!(config.patterns.len(), 2);
        assert!(config.publisher.stdout);
        assert!(!config.publisher.telegram.enabled);
        assert_eq!(config.ingest.topic_prefix, "te/device/");
    }

    #[test]
    fn tables_can_be_replaced_from_toml() {
        let temp = tempdir().expect("tempdir should be created");
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[detector]
cooldown_secs = 30

[[thresholds]]
metric = "coolant_level"
min = 20.0
max = 80.0
critical = 10.0
critical_direction = "low"

[[patterns]]
name = "cavitation"
subject = "impeller"
severity = "warning"
scope = "window"
message = "Cavitation suspected"
recommendation = "Check suction pressure"

[[patterns.conditions]]
metric = "vibration"
comparison = "above"
bound = 0.1
"#,
        )
        .expect("config should be written");

        let config = load_config(&path).expect("config should load");
        assert_eq!(config.detector.cooldown_secs, 30);
        assert_eq!(config.thresholds.len(), 1);
        assert_eq!(config.thresholds[0].critical, Some(10.0));
        assert_eq!(config.patterns[0].severity, Severity::Warning);
        assert_eq!(config.patterns[0].scope, PatternScope::Window);
        assert_eq!(config.trends.len(), 2);
    }

    #[test]
    fn missing_file_reports_path() {
        let temp = tempdir().expect("tempdir should be created");
        let path = temp.path().join("absent.toml");

        let error = load_config(&path).expect_err("missing file must fail");
        assert!(matches!(error, ConfigError::Read { .. }));
        assert!(error.to_string().contains("absent.toml"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let temp = tempdir().expect("tempdir should be created");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[detector\ncooldown_secs = ").expect("config should be written");

        let error = load_config(&path).expect_err("broken toml must fail");
        assert!(matches!(error, ConfigError::Parse { .. }));
    }

    #[test]
    fn validation_rejects_inconsistent_windows() {
        let mut config = Config::default();
        config.detector.trend_min_readings = 12;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = Config::default();
        config.detector.pattern_window = 50;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = Config::default();
        config.detector.cooldown_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validation_rejects_bad_tables_and_publishers() {
        let mut config = Config::default();
        config.thresholds.push(config.thresholds[0].clone());
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = Config::default();
        config.thresholds[0].min = 100.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = Config::default();
        config.trends[0].max_rate = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = Config::default();
        config.publisher.telegram.enabled = true;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = Config::default();
        config.publisher.stdout = false;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        assert!(Config::default().validate().is_ok());
    }
}
