//! Logging setup for the dlink binary
//!
//! Console output goes to stderr so command output on stdout stays clean.
//! JSON logs, when enabled, go to a daily rolling file.

use std::path::PathBuf;

use dlink_core::LogSettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory where JSON log files are written
    pub log_dir: PathBuf,
    pub enable_json_logs: bool,
    pub enable_console_logs: bool,
    pub include_location: bool,
    /// Log span open/close, for timing connector and compile calls
    pub enable_spans: bool,
    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: log_directory(),
            enable_json_logs: false,
            enable_console_logs: true,
            include_location: false,
            enable_spans: false,
            default_filter: "warn,dlink_core=info,dlink_connectors=info,dlink_pipeline=info"
                .to_string(),
        }
    }
}

impl LoggingConfig {
    /// Quiet console, JSON file logs for later inspection
    pub fn production() -> Self {
        Self {
            enable_json_logs: true,
            default_filter: "warn".to_string(),
            ..Self::default()
        }
    }

    /// Verbose console with locations and spans
    pub fn development() -> Self {
        Self {
            include_location: true,
            enable_spans: true,
            default_filter: "info,dlink_core=debug,dlink_connectors=debug,dlink_pipeline=debug,dlink_connector_file=debug,dlink_connector_jdbc=debug".to_string(),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub fn testing() -> Self {
        Self {
            log_dir: std::env::temp_dir().join("dlink-tests"),
            enable_json_logs: false,
            enable_console_logs: true,
            include_location: true,
            enable_spans: true,
            default_filter: "debug".to_string(),
        }
    }

    /// Apply the `[logging]` section of the runtime config
    pub fn with_settings(mut self, settings: &LogSettings) -> Self {
        if let Some(filter) = settings.filter.as_ref().filter(|f| !f.trim().is_empty()) {
            self.default_filter = filter.clone();
        }
        self.enable_json_logs |= settings.json;
        self
    }
}

/// Install the global subscriber. Fails if one is already installed.
///
/// The returned guard flushes the JSON file writer when dropped and must be
/// held until the command finishes.
pub fn init(config: LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let span_events = if config.enable_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let mut layers = Vec::new();
    let mut guard = None;

    if config.enable_console_logs {
        let console_layer = fmt::layer()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_span_events(span_events.clone())
            .with_writer(std::io::stderr)
            .with_filter(env_filter.clone())
            .boxed();
        layers.push(console_layer);
    }

    if config.enable_json_logs {
        std::fs::create_dir_all(&config.log_dir)?;
        let file_appender = tracing_appender::rolling::daily(&config.log_dir, "dlink.log");
        let (non_blocking, worker) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(span_events)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(non_blocking)
            .with_filter(env_filter)
            .boxed();
        layers.push(json_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::debug!(
        log_dir = %config.log_dir.display(),
        json_enabled = config.enable_json_logs,
        "logging initialized"
    );
    Ok(guard)
}

pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dlink")
        .join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_logs_to_console_only() {
        let config = LoggingConfig::default();
        assert!(config.enable_console_logs);
        assert!(!config.enable_json_logs);
        assert!(config.log_dir.ends_with("dlink/logs"));
    }

    #[test]
    fn test_production_config() {
        let config = LoggingConfig::production();
        assert!(config.enable_json_logs);
        assert!(!config.include_location);
        assert_eq!(config.default_filter, "warn");
    }

    #[test]
    fn test_settings_override_filter_and_enable_json() {
        let settings = LogSettings {
            filter: Some("dlink_pipeline=trace".to_string()),
            json: true,
        };
        let config = LoggingConfig::development().with_settings(&settings);
        assert_eq!(config.default_filter, "dlink_pipeline=trace");
        assert!(config.enable_json_logs);

        let blank = LogSettings {
            filter: Some("  ".to_string()),
            json: false,
        };
        let config = LoggingConfig::production().with_settings(&blank);
        assert_eq!(config.default_filter, "warn");
        assert!(config.enable_json_logs);
    }
}
