use crate::error::{Error, Result};
use crate::helpers::proxied_url;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, ClientBuilder, Method, Url};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_USER_AGENT: &str = concat!("manga_extensions/", env!("CARGO_PKG_VERSION"));

/// Per-request options understood by every [`Transport`].
#[derive(Clone, Debug)]
pub struct FetchOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    /// JSON request body
    pub data: Option<Value>,
    /// Query string pairs; repeat a key for array parameters (`includes[]`).
    pub params: Vec<(String, String)>,
    /// Overrides the client-wide timeout for this call
    pub timeout: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            data: None,
            params: Vec::new(),
            timeout: None,
        }
    }
}

impl FetchOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// The HTTP collaborator adapters fetch JSON through.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str, options: FetchOptions) -> Result<Value>;
}

/// Configuration for the reqwest-backed transport
#[derive(Clone, Debug)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: String,
    /// Prefix the percent-encoded target URL is appended to
    pub proxy_url: Option<String>,
    pub enable_gzip: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy_url: None,
            enable_gzip: true,
        }
    }
}

/// JSON transport over reqwest. Failed requests are final; nothing is retried.
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .gzip(config.enable_gzip)
            .brotli(config.enable_gzip)
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Get the underlying reqwest client for direct access
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Full request URL: query string applied, then routed through the proxy if any.
    pub fn resolve_url(&self, url: &str, params: &[(String, String)]) -> Result<String> {
        let mut target = Url::parse(url).map_err(|e| Error::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !params.is_empty() {
            target.query_pairs_mut().extend_pairs(params.iter());
        }
        Ok(proxied_url(target.as_str(), self.config.proxy_url.as_deref()))
    }

    fn status_error(status: reqwest::StatusCode, url: &str) -> Error {
        if status == reqwest::StatusCode::NOT_FOUND {
            Error::NotFound(url.to_string())
        } else {
            Error::Http {
                status: status.as_u16(),
                url: url.to_string(),
            }
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn fetch(&self, url: &str, options: FetchOptions) -> Result<Value> {
        let target = self.resolve_url(url, &options.params)?;
        log::debug!("{} {}", options.method, target);

        let mut request = self
            .client
            .request(options.method.clone(), &target)
            .timeout(options.timeout.unwrap_or(self.config.timeout));
        for (key, value) in &options.headers {
            request = request.header(key.as_str(), value.as_str());
        }
        if let Some(data) = &options.data {
            request = request.json(data);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            log::warn!("Received status {} for {}", status, url);
            return Err(Self::status_error(status, url));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
        assert_eq!(client.unwrap().config().timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            HttpClient::status_error(reqwest::StatusCode::NOT_FOUND, "u"),
            Error::NotFound(_)
        ));
        assert!(matches!(
            HttpClient::status_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "u"),
            Error::Http { status: 429, .. }
        ));
    }

    #[test]
    fn test_resolve_url_with_array_params() {
        let client = HttpClient::new().unwrap();
        let params = vec![
            ("includes[]".to_string(), "cover_art".to_string()),
            ("includes[]".to_string(), "author".to_string()),
            ("limit".to_string(), "20".to_string()),
        ];
        let url = client.resolve_url("https://api.mangadex.org/manga", &params).unwrap();
        assert_eq!(
            url,
            "https://api.mangadex.org/manga?includes%5B%5D=cover_art&includes%5B%5D=author&limit=20"
        );
        assert_eq!(
            client.resolve_url("https://api.mangadex.org/manga/tag", &[]).unwrap(),
            "https://api.mangadex.org/manga/tag"
        );
    }

    #[test]
    fn test_resolve_url_through_proxy() {
        let client = HttpClient::with_config(HttpClientConfig {
            proxy_url: Some("https://proxy.local/?url=".to_string()),
            ..HttpClientConfig::default()
        })
        .unwrap();
        let url = client
            .resolve_url("https://api.mangadex.org/manga", &[("limit".into(), "1".into())])
            .unwrap();
        assert_eq!(
            url,
            "https://proxy.local/?url=https%3A%2F%2Fapi.mangadex.org%2Fmanga%3Flimit%3D1"
        );
    }

    #[test]
    fn test_invalid_url() {
        let client = HttpClient::new().unwrap();
        assert!(matches!(
            client.resolve_url("not a url", &[]),
            Err(Error::InvalidUrl { .. })
        ));
    }
}
