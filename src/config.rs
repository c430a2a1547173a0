//! Layered configuration: defaults → JSON file → environment → CLI flags,
//! environment winning over both file and CLI per the documented precedence.

use crate::error::ConfigError;
use serde::Deserialize;
use std::net::IpAddr;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsSection {
    pub enabled: bool,
    pub cert_file: Option<String>,
    pub key_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub tls: TlsSection,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            tls: TlsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsSection {
    pub max_body_size: u64,
    pub max_headers_size: u64,
    pub timeout_seconds: u64,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_body_size: 10 * 1024 * 1024,
            max_headers_size: 16 * 1024,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerSection,
    pub limits: LimitsSection,
    pub logging: LoggingSection,
}

/// Overrides collected from CLI flags, applied below file but above nothing
/// except environment variables.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls_enabled: Option<bool>,
    pub tls_cert_file: Option<String>,
    pub tls_key_file: Option<String>,
    pub max_body_size: Option<u64>,
    pub max_headers_size: Option<u64>,
    pub timeout_seconds: Option<u64>,
    pub log_level: Option<LogLevel>,
    pub log_format: Option<LogFormat>,
}

impl Config {
    pub fn load(cli_config_path: Option<&Path>, overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(path) = cli_config_path {
            config = Self::merge_file(config, path)?;
        }
        config.merge_overrides(overrides);
        config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    fn merge_file(base: Config, path: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file_config: Config = serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })?;
        let _ = base;
        Ok(file_config)
    }

    fn merge_overrides(&mut self, overrides: CliOverrides) {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(enabled) = overrides.tls_enabled {
            self.server.tls.enabled = enabled;
        }
        if let Some(cert) = overrides.tls_cert_file {
            self.server.tls.cert_file = Some(cert);
        }
        if let Some(key) = overrides.tls_key_file {
            self.server.tls.key_file = Some(key);
        }
        if let Some(v) = overrides.max_body_size {
            self.limits.max_body_size = v;
        }
        if let Some(v) = overrides.max_headers_size {
            self.limits.max_headers_size = v;
        }
        if let Some(v) = overrides.timeout_seconds {
            self.limits.timeout_seconds = v;
        }
        if let Some(v) = overrides.log_level {
            self.logging.level = v;
        }
        if let Some(v) = overrides.log_format {
            self.logging.format = v;
        }
    }

    fn merge_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(v) = std::env::var("HTTP_SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = std::env::var("HTTP_SERVER_PORT") {
            self.server.port = v.parse().map_err(|_| ConfigError::Invalid {
                field: "HTTP_SERVER_PORT",
                message: v,
            })?;
        }
        if let Ok(v) = std::env::var("HTTP_SERVER_TLS_ENABLED") {
            self.server.tls.enabled = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = std::env::var("HTTP_SERVER_TLS_CERT_FILE") {
            self.server.tls.cert_file = Some(v);
        }
        if let Ok(v) = std::env::var("HTTP_SERVER_TLS_KEY_FILE") {
            self.server.tls.key_file = Some(v);
        }
        if let Ok(v) = std::env::var("HTTP_SERVER_MAX_BODY_SIZE") {
            self.limits.max_body_size = v.parse().map_err(|_| ConfigError::Invalid {
                field: "HTTP_SERVER_MAX_BODY_SIZE",
                message: v,
            })?;
        }
        if let Ok(v) = std::env::var("HTTP_SERVER_MAX_HEADERS_SIZE") {
            self.limits.max_headers_size = v.parse().map_err(|_| ConfigError::Invalid {
                field: "HTTP_SERVER_MAX_HEADERS_SIZE",
                message: v,
            })?;
        }
        if let Ok(v) = std::env::var("HTTP_SERVER_TIMEOUT_SECONDS") {
            self.limits.timeout_seconds = v.parse().map_err(|_| ConfigError::Invalid {
                field: "HTTP_SERVER_TIMEOUT_SECONDS",
                message: v,
            })?;
        }
        if let Ok(v) = std::env::var("HTTP_SERVER_LOG_LEVEL") {
            self.logging.level = match v.to_ascii_lowercase().as_str() {
                "debug" => LogLevel::Debug,
                "info" => LogLevel::Info,
                "warn" => LogLevel::Warn,
                "error" => LogLevel::Error,
                _ => return Err(ConfigError::Invalid { field: "HTTP_SERVER_LOG_LEVEL", message: v }),
            };
        }
        if let Ok(v) = std::env::var("HTTP_SERVER_LOG_FORMAT") {
            self.logging.format = match v.to_ascii_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => return Err(ConfigError::Invalid { field: "HTTP_SERVER_LOG_FORMAT", message: v }),
            };
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.server.host.parse::<IpAddr>().map_err(|_| ConfigError::Invalid {
            field: "server.host",
            message: format!("{} is not a valid IP address", self.server.host),
        })?;
        if self.limits.max_body_size < 1024 {
            return Err(ConfigError::Invalid {
                field: "limits.max_body_size",
                message: "must be at least 1024 bytes".to_string(),
            });
        }
        if self.limits.max_headers_size < 1024 {
            return Err(ConfigError::Invalid {
                field: "limits.max_headers_size",
                message: "must be at least 1024 bytes".to_string(),
            });
        }
        if self.limits.timeout_seconds < 1 {
            return Err(ConfigError::Invalid {
                field: "limits.timeout_seconds",
                message: "must be at least 1 second".to_string(),
            });
        }
        if self.server.tls.enabled && (self.server.tls.cert_file.is_none() || self.server.tls.key_file.is_none()) {
            return Err(ConfigError::Invalid {
                field: "server.tls",
                message: "tls-enabled requires both cert and key file".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let config = Config::load(None, CliOverrides::default()).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn cli_overrides_apply_over_defaults() {
        let overrides = CliOverrides {
            port: Some(9090),
            ..Default::default()
        };
        let config = Config::load(None, overrides).unwrap();
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn rejects_undersized_body_limit() {
        let overrides = CliOverrides {
            max_body_size: Some(100),
            ..Default::default()
        };
        assert!(Config::load(None, overrides).is_err());
    }

    #[test]
    fn tls_enabled_without_cert_is_rejected() {
        let overrides = CliOverrides {
            tls_enabled: Some(true),
            ..Default::default()
        };
        assert!(Config::load(None, overrides).is_err());
    }
}
