use log::{debug, warn};
use std::time::Duration;

use crate::auth::DEFAULT_WINDOW_SECS;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Runtime configuration, resolved from environment variables:
/// - `UPSTREAM_URL`: base address of the groupware admin service (required)
/// - `ADMIN_USER` / `ADMIN_PASSWORD`: admin principal used for session acquisition (required)
/// - `HMAC_KEY`: secret shared with gateway callers (required)
/// - `HMAC_WINDOW_SECS`: allowed timestamp skew (default: 30)
/// - `GATEWAY_PORT`: listening port (default: 5000)
/// - `UPSTREAM_TIMEOUT_SECS`: outbound request timeout (default: 10)
/// - `UPSTREAM_INSECURE_TLS`: skip certificate validation, lab use only (default: false)
/// - `WEB_CLIENT_URL`: base address used in preauth links (default: `UPSTREAM_URL`)
#[derive(Clone)]
pub struct Config {
    pub upstream_url: String,
    pub admin_user: String,
    pub admin_password: String,
    pub hmac_key: Vec<u8>,
    pub hmac_window: i64,
    pub port: u16,
    pub upstream_timeout: Duration,
    pub insecure_tls: bool,
    pub web_client_url: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("upstream_url", &self.upstream_url)
            .field("admin_user", &self.admin_user)
            .field("admin_password", &"<redacted>")
            .field("hmac_key", &"<redacted>")
            .field("hmac_window", &self.hmac_window)
            .field("port", &self.port)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("insecure_tls", &self.insecure_tls)
            .field("web_client_url", &self.web_client_url)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let upstream_url = required("UPSTREAM_URL")?.trim_end_matches('/').to_string();
        let admin_user = required("ADMIN_USER")?;
        let admin_password = required("ADMIN_PASSWORD")?;
        let hmac_key = required("HMAC_KEY")?.into_bytes();

        let hmac_window = parse_or(&lookup, "HMAC_WINDOW_SECS", DEFAULT_WINDOW_SECS)?;
        if hmac_window < 0 {
            return Err(ConfigError::Invalid {
                var: "HMAC_WINDOW_SECS",
                value: hmac_window.to_string(),
            });
        }
        let port = parse_or(&lookup, "GATEWAY_PORT", DEFAULT_PORT)?;
        let timeout_secs = parse_or(&lookup, "UPSTREAM_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let insecure_tls = parse_bool(&lookup, "UPSTREAM_INSECURE_TLS")?;

        let web_client_url = lookup("WEB_CLIENT_URL")
            .filter(|v| !v.is_empty())
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| {
                debug!("[config] WEB_CLIENT_URL not set, defaulting to {}", upstream_url);
                upstream_url.clone()
            });

        if insecure_tls {
            warn!("[config] UPSTREAM_INSECURE_TLS is on, upstream certificates will not be verified");
        }

        Ok(Config {
            upstream_url,
            admin_user,
            admin_password,
            hmac_key,
            hmac_window,
            port,
            upstream_timeout: Duration::from_secs(timeout_secs),
            insecure_tls,
            web_client_url,
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display,
{
    match lookup(var) {
        None => {
            debug!("[config] {} not set, defaulting to {}", var, default);
            Ok(default)
        }
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

fn parse_bool<F>(lookup: &F, var: &'static str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var).as_deref().map(str::trim) {
        None | Some("") => Ok(false),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(false),
        Some(v) => Err(ConfigError::Invalid {
            var,
            value: v.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("UPSTREAM_URL", "https://mail.example.com:7071/"),
        ("ADMIN_USER", "admin@example.com"),
        ("ADMIN_PASSWORD", "hunter2"),
        ("HMAC_KEY", "k3y"),
    ];

    #[test]
    fn defaults_when_only_required_vars_set() {
        let config = Config::from_lookup(env(&REQUIRED)).unwrap();

        assert_eq!(config.upstream_url, "https://mail.example.com:7071");
        assert_eq!(config.web_client_url, "https://mail.example.com:7071");
        assert_eq!(config.admin_user, "admin@example.com");
        assert_eq!(config.hmac_key, b"k3y");
        assert_eq!(config.hmac_window, 30);
        assert_eq!(config.port, 5000);
        assert_eq!(config.upstream_timeout, Duration::from_secs(10));
        assert!(!config.insecure_tls);
    }

    #[test]
    fn reads_optional_vars() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("HMAC_WINDOW_SECS", "60"),
            ("GATEWAY_PORT", "8081"),
            ("UPSTREAM_TIMEOUT_SECS", "3"),
            ("UPSTREAM_INSECURE_TLS", "true"),
            ("WEB_CLIENT_URL", "https://webmail.example.com/"),
        ]);
        let config = Config::from_lookup(env(&pairs)).unwrap();

        assert_eq!(config.hmac_window, 60);
        assert_eq!(config.port, 8081);
        assert_eq!(config.upstream_timeout, Duration::from_secs(3));
        assert!(config.insecure_tls);
        assert_eq!(config.web_client_url, "https://webmail.example.com");
    }

    #[test]
    fn missing_required_var_is_an_error() {
        for skip in 0..REQUIRED.len() {
            let pairs: Vec<_> = REQUIRED
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, p)| *p)
                .collect();
            let err = Config::from_lookup(env(&pairs)).unwrap_err();
            assert_eq!(err, ConfigError::Missing(REQUIRED[skip].0));
        }
    }

    #[test]
    fn empty_required_var_counts_as_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs[3] = ("HMAC_KEY", "");
        assert_eq!(
            Config::from_lookup(env(&pairs)).unwrap_err(),
            ConfigError::Missing("HMAC_KEY")
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        for (var, value) in [
            ("GATEWAY_PORT", "not-a-number"),
            ("HMAC_WINDOW_SECS", "-5"),
            ("UPSTREAM_TIMEOUT_SECS", "soon"),
            ("UPSTREAM_INSECURE_TLS", "maybe"),
        ] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push((var, value));
            let err = Config::from_lookup(env(&pairs)).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { var: v, .. } if v == var), "{}", var);
        }
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = Config::from_lookup(env(&REQUIRED)).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("k3y"));
    }
}
