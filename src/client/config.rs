use std::time::Duration;

use url::Url;

/// Default heartbeat period.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Default bound on every handshake/heartbeat call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client-side configuration.
///
/// ```rust,ignore
/// let config = ClientConfig::new("https://merchant.example.com".parse()?)
///     .with_heartbeat_interval(Duration::from_secs(300));
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ClientConfig {
    pub(crate) base_url: Url,
    pub(crate) request_timeout: Duration,
    pub(crate) heartbeat_interval: Duration,
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::new("https://shop.example.com".parse().unwrap());
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(900));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn overrides() {
        let config = ClientConfig::new("https://shop.example.com".parse().unwrap())
            .with_request_timeout(Duration::from_secs(2))
            .with_heartbeat_interval(Duration::from_secs(60));
        assert_eq!(config.request_timeout(), Duration::from_secs(2));
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(60));
    }
}
