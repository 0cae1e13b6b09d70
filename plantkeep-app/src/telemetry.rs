//! Tracing subscriber initialization.

use std::fmt;
use std::str::FromStr;

use plantkeep_core::ConfigError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "plantkeep_app=info,plantkeep_storage=info,warn";

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(ConfigError::InvalidValue {
                field: "PLANTKEEP_LOG_FORMAT".to_string(),
                value: other.to_string(),
                reason: "expected json or pretty".to_string(),
            }),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
        }
    }
}

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    pub log_format: LogFormat,
    /// Filter directives used when `RUST_LOG` is unset
    pub default_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "plantkeep".to_string(),
            log_format: LogFormat::default(),
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Environment variables:
    /// - `PLANTKEEP_SERVICE_NAME` (default: plantkeep)
    /// - `PLANTKEEP_LOG_FORMAT`: json or pretty (default: json)
    /// - `RUST_LOG` is read by the subscriber itself
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let log_format = match lookup("PLANTKEEP_LOG_FORMAT") {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => defaults.log_format,
        };
        Ok(Self {
            service_name: lookup("PLANTKEEP_SERVICE_NAME")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.service_name),
            log_format,
            default_filter: defaults.default_filter,
        })
    }
}

/// Install the global tracing subscriber.
///
/// Call once at startup. A second call fails with a `ConfigError` instead of
/// replacing the installed subscriber.
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), ConfigError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).try_init(),
    };
    installed.map_err(|e| ConfigError::InvalidValue {
        field: "tracing subscriber".to_string(),
        value: config.log_format.to_string(),
        reason: e.to_string(),
    })?;

    tracing::info!(
        service_name = %config.service_name,
        log_format = %config.log_format,
        "Telemetry initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_config_default() {
        let config = TelemetryConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, TelemetryConfig::default());
        assert_eq!(config.service_name, "plantkeep");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" pretty ".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());

        let err = TelemetryConfig::from_lookup(|name| {
            (name == "PLANTKEEP_LOG_FORMAT").then(|| "yaml".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_init_twice_is_an_error() {
        let config = TelemetryConfig {
            log_format: LogFormat::Pretty,
            ..Default::default()
        };
        // Another test in this binary may have installed it first.
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
