//! Configuration for privgate-daemon

use privgate_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Policy engine configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8087))
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `PRIVGATE_*` environment variables (`__` separates nested keys, e.g.
    /// `PRIVGATE_ENGINE__ASK_GRANT_TIMEFRAME_SECS=120`)
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PRIVGATE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8087);
        assert!(config.server.enable_cors);
        assert_eq!(config.engine.ask_grant_timeframe_secs, 300);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = DaemonConfig::load(None).unwrap();
        assert_eq!(config.engine.default_profile, "Default");
        assert_eq!(config.engine.prompt_timeout_secs, 60);
    }

    #[test]
    fn test_partial_json_config() {
        let config: DaemonConfig =
            serde_json::from_str(r#"{"engine": {"ask_grant_timeframe_secs": 30}}"#).unwrap();
        assert_eq!(config.engine.ask_grant_timeframe_secs, 30);
        assert_eq!(config.server.listen_addr.port(), 8087);
    }
}
