use std::net::SocketAddr;
use std::time::Duration;

use qrlink_web::{CorsConfig, LimitsConfig};

use crate::link::DEFAULT_BASE_URL;

pub const ENV_LISTEN: &str = "QRLINK_LISTEN";
pub const ENV_BASE_URL: &str = "QRLINK_BASE_URL";
pub const ENV_CORS_ORIGINS: &str = "QRLINK_CORS_ORIGINS";
pub const ENV_CORS_CREDENTIALS: &str = "QRLINK_CORS_CREDENTIALS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "QRLINK_REQUEST_TIMEOUT_SECS";
pub const ENV_MAX_BODY_BYTES: &str = "QRLINK_MAX_BODY_BYTES";
pub const ENV_METRICS_LISTEN: &str = "QRLINK_METRICS_LISTEN";

#[derive(Debug, thiserror::Error)]
#[error("{var} must be {expected}, got {value:?}")]
pub struct ConfigError {
    pub var: &'static str,
    pub expected: &'static str,
    pub value: String,
}

/// Runtime settings for the server binary.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Address the HTTP listener binds to
    pub listen: String,
    /// Page encoded into every QR link
    pub base_url: String,
    pub cors: CorsConfig,
    pub limits: LimitsConfig,
    /// Optional Prometheus endpoint served by Pingora
    pub metrics_listen: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            cors: CorsConfig::default(),
            limits: LimitsConfig::default(),
            metrics_listen: None,
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen<S: Into<String>>(mut self, addr: S) -> Self {
        self.listen = addr.into();
        self
    }

    pub fn base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.cors = cors;
        self
    }

    pub fn limits(mut self, limits: LimitsConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Read `QRLINK_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from any variable lookup; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_LISTEN) {
            value.parse::<SocketAddr>().map_err(|_| ConfigError {
                var: ENV_LISTEN,
                expected: "a socket address like 0.0.0.0:8080",
                value: value.clone(),
            })?;
            config.listen = value;
        }

        if let Some(value) = lookup(ENV_BASE_URL) {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(ConfigError {
                    var: ENV_BASE_URL,
                    expected: "an http(s) URL",
                    value,
                });
            }
            config.base_url = value;
        }

        if let Some(value) = lookup(ENV_CORS_ORIGINS) {
            config.cors = parse_origins(config.cors, &value)?;
        }

        if let Some(value) = lookup(ENV_CORS_CREDENTIALS) {
            let allow = parse_bool(&value).ok_or(ConfigError {
                var: ENV_CORS_CREDENTIALS,
                expected: "true or false",
                value,
            })?;
            config.cors = config.cors.allow_credentials(allow);
        }

        if let Some(value) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            let secs = parse_positive(&value).ok_or(ConfigError {
                var: ENV_REQUEST_TIMEOUT_SECS,
                expected: "a positive number of seconds",
                value,
            })?;
            config.limits = config.limits.request_timeout(Duration::from_secs(secs));
        }

        if let Some(value) = lookup(ENV_MAX_BODY_BYTES) {
            let bytes = parse_positive(&value).ok_or(ConfigError {
                var: ENV_MAX_BODY_BYTES,
                expected: "a positive byte count",
                value,
            })?;
            config.limits = config.limits.max_body_size(bytes as usize);
        }

        config.metrics_listen = lookup(ENV_METRICS_LISTEN).filter(|v| !v.trim().is_empty());

        Ok(config)
    }
}

fn parse_origins(cors: CorsConfig, value: &str) -> Result<CorsConfig, ConfigError> {
    let value = value.trim();
    if value == "*" {
        return Ok(cors.allow_any_origin());
    }
    let origins: Vec<&str> = value
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .collect();
    if origins.is_empty() || origins.contains(&"*") {
        return Err(ConfigError {
            var: ENV_CORS_ORIGINS,
            expected: "\"*\" or a comma-separated list of origins",
            value: value.to_string(),
        });
    }
    Ok(cors.allow_origins(origins))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_positive(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrlink_web::middleware::cors::AllowedOrigins;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.listen, "0.0.0.0:8080");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.cors.origins, AllowedOrigins::Any);
        assert!(!config.cors.allow_credentials);
        assert_eq!(config.limits.request_timeout, Duration::from_secs(30));
        assert!(config.metrics_listen.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = from_pairs(&[
            (ENV_LISTEN, "127.0.0.1:9000"),
            (ENV_BASE_URL, "https://pair.example.com/scan"),
            (ENV_CORS_ORIGINS, "https://a.example, https://b.example"),
            (ENV_CORS_CREDENTIALS, "true"),
            (ENV_REQUEST_TIMEOUT_SECS, "5"),
            (ENV_MAX_BODY_BYTES, "1024"),
            (ENV_METRICS_LISTEN, "127.0.0.1:9100"),
        ])
        .unwrap();

        assert_eq!(config.listen, "127.0.0.1:9000");
        assert_eq!(config.base_url, "https://pair.example.com/scan");
        assert_eq!(
            config.cors.origins,
            AllowedOrigins::List(vec![
                "https://a.example".to_string(),
                "https://b.example".to_string()
            ])
        );
        assert!(config.cors.allow_credentials);
        assert_eq!(config.limits.request_timeout, Duration::from_secs(5));
        assert_eq!(config.limits.max_body_size, 1024);
        assert_eq!(config.metrics_listen.as_deref(), Some("127.0.0.1:9100"));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = from_pairs(&[(ENV_LISTEN, "localhost")]).unwrap_err();
        assert_eq!(err.var, ENV_LISTEN);

        let err = from_pairs(&[(ENV_BASE_URL, "ftp://x")]).unwrap_err();
        assert_eq!(err.var, ENV_BASE_URL);

        let err = from_pairs(&[(ENV_CORS_ORIGINS, "https://a, *")]).unwrap_err();
        assert_eq!(err.var, ENV_CORS_ORIGINS);

        let err = from_pairs(&[(ENV_REQUEST_TIMEOUT_SECS, "0")]).unwrap_err();
        assert!(err.to_string().contains(ENV_REQUEST_TIMEOUT_SECS));
    }
}
