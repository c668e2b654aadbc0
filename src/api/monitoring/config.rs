//! Monitoring switches, read from the `[monitoring]` table of `config.toml`

use serde::{Deserialize, Serialize};

/// Monitoring and logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub correlation_ids: bool,
    pub request_logging: bool,
    pub performance_metrics: bool,
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn rank(&self) -> u8 {
        match self {
            LogLevel::Error => 0,
            LogLevel::Warn => 1,
            LogLevel::Info => 2,
            LogLevel::Debug => 3,
            LogLevel::Trace => 4,
        }
    }

    /// Whether a message at `level` passes this threshold
    pub fn allows(&self, level: LogLevel) -> bool {
        level.rank() <= self.rank()
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            correlation_ids: true,
            request_logging: true,
            performance_metrics: true,
            log_level: LogLevel::Info,
        }
    }
}

impl MonitoringConfig {
    /// Everything off except error-level events
    pub fn disabled() -> Self {
        Self {
            correlation_ids: false,
            request_logging: false,
            performance_metrics: false,
            log_level: LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitoringConfig::default();

        assert!(config.correlation_ids);
        assert!(config.request_logging);
        assert!(config.performance_metrics);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_disabled_config() {
        let config = MonitoringConfig::disabled();

        assert!(!config.correlation_ids);
        assert!(!config.request_logging);
        assert!(!config.performance_metrics);
    }

    #[test]
    fn test_level_threshold() {
        assert!(LogLevel::Warn.allows(LogLevel::Error));
        assert!(LogLevel::Warn.allows(LogLevel::Warn));
        assert!(!LogLevel::Warn.allows(LogLevel::Info));
        assert!(LogLevel::Trace.allows(LogLevel::Debug));
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: MonitoringConfig = toml::from_str("log_level = \"debug\"").unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert!(config.request_logging);
    }
}
