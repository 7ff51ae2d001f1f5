//! Daemon configuration.
//!
//! Values come from an optional `kanflow.toml` in the working directory,
//! then `KANFLOW_*` environment variables. `RUST_LOG` beats `KANFLOW_LOG`.

use serde::Deserialize;

use kanflow_app::dispatcher::DispatcherConfig;

/// Settings for `kanflowd`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    /// Background event queue settings.
    pub dispatcher: QueueConfig,
}

/// `[server]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to listen on.
    pub host: String,
    pub port: u16,
}

/// `[database]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite::memory:`.
    pub url: String,
    /// Pool size for file-backed databases.
    pub max_connections: u32,
}

/// `[logging]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive.
    pub filter: String,
}

/// `[dispatcher]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Events accepted before ingestion answers `503`.
    pub queue_capacity: usize,
    /// Duplicate-suppression window in milliseconds; `0` disables it.
    pub dedupe_window_ms: u64,
}

impl Config {
    /// Read `kanflow.toml`, apply the process environment and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("kanflow.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Apply overrides from `lookup`, usually the process environment.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("KANFLOW_HOST") {
            self.server.host = val;
        }
        if let Some(port) = lookup("KANFLOW_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = lookup("KANFLOW_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = lookup("KANFLOW_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = lookup("KANFLOW_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(capacity) = lookup("KANFLOW_QUEUE_CAPACITY").and_then(|val| val.parse().ok()) {
            self.dispatcher.queue_capacity = capacity;
        }
        if let Some(window) = lookup("KANFLOW_DEDUPE_WINDOW_MS").and_then(|val| val.parse().ok()) {
            self.dispatcher.dedupe_window_ms = window;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("server port cannot be 0".to_string()));
        }
        if self.dispatcher.queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "dispatcher queue_capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    #[must_use]
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            queue_capacity: self.dispatcher.queue_capacity,
            dedupe_window_ms: self.dispatcher.dedupe_window_ms,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:kanflow.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "kanflowd=info,kanflow=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        let defaults = DispatcherConfig::default();
        Self {
            queue_capacity: defaults.queue_capacity,
            dedupe_window_ms: defaults.dedupe_window_ms,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite:kanflow.db?mode=rwc");
        assert_eq!(config.dispatcher_config(), DispatcherConfig::default());
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '10.0.0.5'
            port = 8088

            [database]
            url = 'sqlite:/var/lib/kanflow/kanflow.db'
            max_connections = 2

            [logging]
            filter = 'kanflow=trace'

            [dispatcher]
            queue_capacity = 16
            dedupe_window_ms = 0
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "10.0.0.5");
        assert_eq!(config.server.port, 8088);
        assert_eq!(config.database.url, "sqlite:/var/lib/kanflow/kanflow.db");
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.logging.filter, "kanflow=trace");
        assert_eq!(
            config.dispatcher_config(),
            DispatcherConfig {
                queue_capacity: 16,
                dedupe_window_ms: 0,
            }
        );
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [dispatcher]
            dedupe_window_ms = 250
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.dispatcher.dedupe_window_ms, 250);
        assert_eq!(config.dispatcher.queue_capacity, 1024);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_fail_on_wrong_value_type() {
        let result: Result<Config, _> = toml::from_str("[dispatcher]\nqueue_capacity = 'lots'");
        assert!(result.is_err());
    }

    #[test]
    fn should_apply_environment_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("KANFLOW_BIND", "127.0.0.1:8081"),
            ("KANFLOW_DATABASE_URL", "sqlite::memory:"),
            ("KANFLOW_QUEUE_CAPACITY", "8"),
            ("KANFLOW_DEDUPE_WINDOW_MS", "500"),
        ]));
        assert_eq!(config.bind_addr(), "127.0.0.1:8081");
        assert_eq!(config.database_url(), "sqlite::memory:");
        assert_eq!(config.dispatcher.queue_capacity, 8);
        assert_eq!(config.dispatcher.dedupe_window_ms, 500);
    }

    #[test]
    fn should_prefer_rust_log_over_kanflow_log() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("KANFLOW_LOG", "warn"), ("RUST_LOG", "trace")]));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_unparsable_numeric_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("KANFLOW_PORT", "http"), ("KANFLOW_QUEUE_CAPACITY", "-1")]));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.dispatcher.queue_capacity, 1024);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_queue_capacity() {
        let mut config = Config::default();
        config.dispatcher.queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }
}
