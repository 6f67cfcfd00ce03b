//! Backend origin configuration.
//!
//! A single base-URL setting selects the backend; everything else (the
//! websocket endpoint, polling and keep-alive cadence, the render size
//! ceiling) is derived from it or carries a default matching the service's
//! development setup.

use std::time::Duration;

use url::Url;

use crate::error::FetchError;

/// Environment variable naming the backend origin.
pub const API_URL_ENV: &str = "GEOPREVIEW_API_URL";

/// Development default when no origin is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Largest output dimension the resampler will produce on either axis.
pub const DEFAULT_MAX_DIM: usize = 1200;

/// How often the gallery re-fetches the asset list.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Keep-alive cadence on the notification channel.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend origin, e.g. `http://localhost:8000`. No trailing slash.
    pub base_url: String,
    pub max_dim: usize,
    pub poll_interval: Duration,
    pub ping_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl Config {
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            max_dim: DEFAULT_MAX_DIM,
            poll_interval: DEFAULT_POLL_INTERVAL,
            ping_interval: DEFAULT_PING_INTERVAL,
        }
    }

    /// Read the backend origin from `GEOPREVIEW_API_URL`, falling back to
    /// the local development origin.
    #[must_use]
    pub fn from_env() -> Self {
        let base = std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::new(&base)
    }

    /// The live-notification endpoint: same origin with the scheme
    /// upgraded (`http` -> `ws`, `https` -> `wss`) and `/ws` appended.
    pub fn ws_url(&self) -> Result<String, FetchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| FetchError::Url(format!("{}: {e}", self.base_url)))?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(FetchError::Url(format!("unsupported scheme {other}"))),
        };
        url.set_scheme(scheme)
            .map_err(|()| FetchError::Url("scheme upgrade rejected".to_string()))?;

        Ok(format!("{}ws", ensure_trailing_slash(url.as_str())))
    }

    /// Endpoint for a stored asset's raw bytes.
    #[must_use]
    pub fn download_url(&self, id: i64) -> String {
        format!("{}/images/{id}/download", self.base_url)
    }
}

fn ensure_trailing_slash(s: &str) -> String {
    if s.ends_with('/') {
        s.to_string()
    } else {
        format!("{s}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_upgrades_scheme() {
        let config = Config::new("http://localhost:8000");
        assert_eq!(config.ws_url().unwrap(), "ws://localhost:8000/ws");

        let config = Config::new("https://geo.example.com");
        assert_eq!(config.ws_url().unwrap(), "wss://geo.example.com/ws");
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let config = Config::new("http://localhost:8000/");
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.download_url(7), "http://localhost:8000/images/7/download");
    }

    #[test]
    fn defaults_match_development_setup() {
        let config = Config::default();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.max_dim, 1200);
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.ping_interval, Duration::from_secs(20));
    }
}
