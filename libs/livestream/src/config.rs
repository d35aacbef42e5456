use std::{env, time::Duration};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::endpoint::DEFAULT_STREAM_URL;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StreamConfig {
    #[serde(default = "default_stream_url")]
    pub url: String,
    /// Milliseconds between a frame sink failure and the next attempt
    #[serde(default)]
    pub retry_delay: RetryDelay,
    /// Milliseconds between health endpoint polls
    #[serde(default)]
    pub poll_interval: PollInterval,
    /// Upper bound in milliseconds for a single health request
    #[serde(default)]
    pub request_timeout: RequestTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryDelay(pub u64);

impl Default for RetryDelay {
    fn default() -> Self {
        RetryDelay(2000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollInterval(pub u64);

impl Default for PollInterval {
    fn default() -> Self {
        PollInterval(2000)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTimeout(pub u64);

impl Default for RequestTimeout {
    fn default() -> Self {
        RequestTimeout(1500)
    }
}

fn default_stream_url() -> String {
    env::var("STREAM_URL").unwrap_or_else(|_| DEFAULT_STREAM_URL.to_string())
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: default_stream_url(),
            retry_delay: Default::default(),
            poll_interval: Default::default(),
            request_timeout: Default::default(),
        }
    }
}

impl StreamConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay.0)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval.0)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout.0)
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.url).map_err(|source| Error::InvalidUrl {
            url: self.url.clone(),
            source,
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "stream url must be http or https: {}",
                self.url
            )));
        }
        if self.poll_interval.0 == 0 {
            return Err(Error::Config("poll_interval must be positive".to_string()));
        }
        if self.request_timeout.0 == 0 {
            return Err(Error::Config("request_timeout must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = StreamConfig::new(DEFAULT_STREAM_URL);
        assert_eq!(cfg.retry_delay(), Duration::from_millis(2000));
        assert_eq!(cfg.poll_interval(), Duration::from_millis(2000));
        assert_eq!(cfg.request_timeout(), Duration::from_millis(1500));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let cfg: StreamConfig = toml::from_str(
            r#"
            url = "http://camera.local:8000/video/stream"
            retry_delay = 500
            "#,
        )
        .unwrap();
        assert_eq!(cfg.url, "http://camera.local:8000/video/stream");
        assert_eq!(cfg.retry_delay(), Duration::from_millis(500));
        assert_eq!(cfg.poll_interval, PollInterval::default());
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        assert!(matches!(
            StreamConfig::new("/video/stream").validate(),
            Err(Error::InvalidUrl { .. })
        ));
        assert!(matches!(
            StreamConfig::new("ftp://h/video/stream").validate(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut cfg = StreamConfig::new(DEFAULT_STREAM_URL);
        cfg.poll_interval = PollInterval(0);
        assert!(cfg.validate().is_err());
    }
}
