use crate::error::{Error, Result};
use crate::http_client::{HttpClient, HttpClientConfig, DEFAULT_USER_AGENT};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// CORS proxy prefix; the encoded target URL is appended to it
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// Enable gzip/brotli compression
    #[serde(default = "default_true")]
    pub enable_compression: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourcesConfig {
    /// Extension names that start deactivated
    #[serde(default)]
    pub inactive: Vec<String>,
}

fn default_true() -> bool { true }
fn default_timeout_ms() -> u64 { 30_000 }
fn default_user_agent() -> String { DEFAULT_USER_AGENT.to_string() }

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
            proxy_url: None,
            enable_compression: true,
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to defaults
    /// when it is missing or invalid.
    pub fn load() -> Self {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => match Self::from_toml(&content) {
                Ok(cfg) => cfg,
                Err(e) => {
                    log::warn!("Ignoring {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn is_inactive(&self, name: &str) -> bool {
        self.sources.inactive.iter().any(|n| n == name)
    }
}

impl HttpConfig {
    pub fn client_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout: Duration::from_millis(self.timeout_ms),
            user_agent: self.user_agent.clone(),
            proxy_url: self.proxy_url.clone().filter(|p| !p.is_empty()),
            enable_gzip: self.enable_compression,
        }
    }

    /// Create the HTTP transport from this configuration
    pub fn create_http_client(&self) -> Result<HttpClient> {
        HttpClient::with_config(self.client_config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.http.timeout_ms, 30_000);
        assert!(cfg.http.proxy_url.is_none());
        assert!(cfg.sources.inactive.is_empty());
        assert_eq!(cfg.http.client_config().timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg = Config::from_toml(
            r#"
            [http]
            proxy_url = "https://proxy.local/?url="

            [sources]
            inactive = ["MangaDex"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.http.timeout_ms, 30_000);
        assert_eq!(cfg.http.proxy_url.as_deref(), Some("https://proxy.local/?url="));
        assert!(cfg.is_inactive("MangaDex"));
        assert!(!cfg.is_inactive("Other"));
    }

    #[test]
    fn test_empty_proxy_is_ignored() {
        let cfg = Config::from_toml("[http]\nproxy_url = \"\"\ntimeout_ms = 500").unwrap();
        let client_cfg = cfg.http.client_config();
        assert!(client_cfg.proxy_url.is_none());
        assert_eq!(client_cfg.timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::from_toml("[http]\ntimeout_ms = \"soon\""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let cfg = Config::load_from(Path::new("/nonexistent/config.toml"));
        assert_eq!(cfg.http.timeout_ms, 30_000);
    }
}
