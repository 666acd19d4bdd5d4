//! Environment configuration for the proxy and the dashboard
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file. Both loaders take a lookup closure so tests can supply variables
//! without touching the real environment.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

use crate::i18n::Language;
use crate::proxy::DEFAULT_UPSTREAM_URL;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:8787/v1/market-prices";
const DEFAULT_RETRY_BASE_MS: u64 = 1000;
/// On-disk cache budget for the dashboard (5 MiB)
pub const DEFAULT_CACHE_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Errors raised while reading configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{name} {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Settings for `mandi serve`
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// data.gov.in key; requests fail with 500 while unset
    pub upstream_api_key: Option<String>,
    /// Bearer token callers must present
    pub access_token: String,
    pub bind_addr: SocketAddr,
    pub upstream_url: String,
    /// Backoff unit between upstream attempts
    pub retry_base: Duration,
}

// Secrets stay out of Debug output, which ends up in logs.
impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("upstream_api_key", &self.upstream_api_key.as_ref().map(|_| "<redacted>"))
            .field("access_token", &"<redacted>")
            .field("bind_addr", &self.bind_addr)
            .field("upstream_url", &self.upstream_url)
            .field("retry_base", &self.retry_base)
            .finish()
    }
}

impl ProxyConfig {
    /// Reads proxy settings through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_token =
            non_empty(&lookup, "PROXY_ACCESS_TOKEN").ok_or(ConfigError::Missing("PROXY_ACCESS_TOKEN"))?;

        let bind_addr = match non_empty(&lookup, "PROXY_BIND_ADDR") {
            Some(raw) => parse_socket_addr(&raw, "PROXY_BIND_ADDR")?,
            None => parse_socket_addr(DEFAULT_BIND_ADDR, "PROXY_BIND_ADDR")?,
        };

        let upstream_url = match non_empty(&lookup, "AGMARKNET_BASE_URL") {
            Some(raw) => parse_http_url(&raw, "AGMARKNET_BASE_URL")?,
            None => DEFAULT_UPSTREAM_URL.to_string(),
        };

        let retry_base_ms = match non_empty(&lookup, "PROXY_RETRY_BASE_MS") {
            Some(raw) => parse_non_negative_u64(&raw, "PROXY_RETRY_BASE_MS")?,
            None => DEFAULT_RETRY_BASE_MS,
        };

        Ok(Self {
            upstream_api_key: non_empty(&lookup, "DATA_GOV_API_KEY"),
            access_token,
            bind_addr,
            upstream_url,
            retry_base: Duration::from_millis(retry_base_ms),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

/// Settings for `mandi dashboard`
#[derive(Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Full URL of the proxy's price endpoint
    pub proxy_url: String,
    pub access_token: String,
    pub language: Language,
    /// Most bytes the on-disk price cache may hold
    pub cache_quota: usize,
}

impl fmt::Debug for DashboardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DashboardConfig")
            .field("proxy_url", &self.proxy_url)
            .field("access_token", &"<redacted>")
            .field("language", &self.language)
            .field("cache_quota", &self.cache_quota)
            .finish()
    }
}

impl DashboardConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_token =
            non_empty(&lookup, "MANDI_ACCESS_TOKEN").ok_or(ConfigError::Missing("MANDI_ACCESS_TOKEN"))?;

        let proxy_url = match non_empty(&lookup, "MANDI_PROXY_URL") {
            Some(raw) => parse_http_url(&raw, "MANDI_PROXY_URL")?,
            None => DEFAULT_PROXY_URL.to_string(),
        };

        let language = match non_empty(&lookup, "MANDI_LANG") {
            Some(raw) => Language::from_code(&raw).ok_or_else(|| ConfigError::Invalid {
                name: "MANDI_LANG",
                reason: format!("must be one of en, te, hi (got {raw:?})"),
            })?,
            None => Language::En,
        };

        let cache_quota = match non_empty(&lookup, "MANDI_CACHE_QUOTA_BYTES") {
            Some(raw) => parse_non_negative_u64(&raw, "MANDI_CACHE_QUOTA_BYTES")? as usize,
            None => DEFAULT_CACHE_QUOTA_BYTES,
        };

        Ok(Self {
            proxy_url,
            access_token,
            language,
            cache_quota,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

/// Loads `.env` from the working directory or its parents, if present
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_socket_addr(raw: &str, name: &'static str) -> Result<SocketAddr, ConfigError> {
    raw.trim().parse::<SocketAddr>().map_err(|_| ConfigError::Invalid {
        name,
        reason: format!("must be a socket address like {DEFAULT_BIND_ADDR} (got {raw:?})"),
    })
}

fn parse_non_negative_u64(raw: &str, name: &'static str) -> Result<u64, ConfigError> {
    raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
        name,
        reason: "must be an integer >= 0".to_string(),
    })
}

fn parse_http_url(raw: &str, name: &'static str) -> Result<String, ConfigError> {
    let url = reqwest::Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        name,
        reason: format!("must be a valid URL: {e}"),
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Invalid {
            name,
            reason: "must use http or https".to_string(),
        });
    }
    Ok(url.to_string())
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

    #[test]
    fn test_proxy_defaults() {
        let config = ProxyConfig::from_lookup(env(&[("PROXY_ACCESS_TOKEN", "secret")])).unwrap();
        assert_eq!(config.access_token, "secret");
        assert_eq!(config.bind_addr, "127.0.0.1:8787".parse().unwrap());
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.retry_base, Duration::from_millis(1000));
        assert!(config.upstream_api_key.is_none());
    }

    #[test]
    fn test_proxy_requires_access_token() {
        let err = ProxyConfig::from_lookup(env(&[("DATA_GOV_API_KEY", "k")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("PROXY_ACCESS_TOKEN"));
        assert_eq!(err.to_string(), "PROXY_ACCESS_TOKEN is required");

        let err = ProxyConfig::from_lookup(env(&[("PROXY_ACCESS_TOKEN", "   ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("PROXY_ACCESS_TOKEN"));
    }

    #[test]
    fn test_proxy_overrides() {
        let config = ProxyConfig::from_lookup(env(&[
            ("PROXY_ACCESS_TOKEN", "secret"),
            ("DATA_GOV_API_KEY", "abc123"),
            ("PROXY_BIND_ADDR", "0.0.0.0:9000"),
            ("AGMARKNET_BASE_URL", "http://localhost:4000/resource"),
            ("PROXY_RETRY_BASE_MS", "25"),
        ]))
        .unwrap();
        assert_eq!(config.upstream_api_key.as_deref(), Some("abc123"));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.upstream_url, "http://localhost:4000/resource");
        assert_eq!(config.retry_base, Duration::from_millis(25));
    }

    #[test]
    fn test_proxy_rejects_bad_values() {
        let err = ProxyConfig::from_lookup(env(&[
            ("PROXY_ACCESS_TOKEN", "secret"),
            ("PROXY_RETRY_BASE_MS", "-5"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PROXY_RETRY_BASE_MS", .. }));

        let err = ProxyConfig::from_lookup(env(&[
            ("PROXY_ACCESS_TOKEN", "secret"),
            ("PROXY_BIND_ADDR", "localhost"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PROXY_BIND_ADDR", .. }));

        let err = ProxyConfig::from_lookup(env(&[
            ("PROXY_ACCESS_TOKEN", "secret"),
            ("AGMARKNET_BASE_URL", "ftp://example.com"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "AGMARKNET_BASE_URL", .. }));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ProxyConfig::from_lookup(env(&[
            ("PROXY_ACCESS_TOKEN", "tok-123"),
            ("DATA_GOV_API_KEY", "key-456"),
        ]))
        .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("tok-123"));
        assert!(!debug.contains("key-456"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_dashboard_config() {
        let config = DashboardConfig::from_lookup(env(&[("MANDI_ACCESS_TOKEN", "tok")])).unwrap();
        assert_eq!(config.proxy_url, DEFAULT_PROXY_URL);
        assert_eq!(config.language, Language::En);
        assert_eq!(config.cache_quota, DEFAULT_CACHE_QUOTA_BYTES);

        let config = DashboardConfig::from_lookup(env(&[
            ("MANDI_ACCESS_TOKEN", "tok"),
            ("MANDI_LANG", "hi"),
            ("MANDI_PROXY_URL", "https://mandi.example.org/v1/market-prices"),
            ("MANDI_CACHE_QUOTA_BYTES", "65536"),
        ]))
        .unwrap();
        assert_eq!(config.language, Language::Hi);
        assert_eq!(config.cache_quota, 65536);
        assert_eq!(config.proxy_url, "https://mandi.example.org/v1/market-prices");

        assert_eq!(
            DashboardConfig::from_lookup(env(&[])).unwrap_err(),
            ConfigError::Missing("MANDI_ACCESS_TOKEN")
        );
        let err = DashboardConfig::from_lookup(env(&[
            ("MANDI_ACCESS_TOKEN", "tok"),
            ("MANDI_LANG", "fr"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MANDI_LANG", .. }));

        let err = DashboardConfig::from_lookup(env(&[
            ("MANDI_ACCESS_TOKEN", "tok"),
            ("MANDI_CACHE_QUOTA_BYTES", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MANDI_CACHE_QUOTA_BYTES", .. }));
    }
}
