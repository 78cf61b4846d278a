//! Backend client configuration.

use std::time::Duration;

use url::Url;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default time-to-live of cached list responses.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Configuration for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the REST API, always ending with `/`.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// How long categories, tags and wilayas stay cached.
    pub cache_ttl: Duration,
}

impl ApiConfig {
    /// Create a configuration with default timeout and cache TTL.
    ///
    /// A trailing `/` is added to the base path if missing so that
    /// endpoints are joined below it rather than replacing its last segment.
    #[must_use]
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the cache TTL.
    #[must_use]
    pub const fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_added() {
        let config = ApiConfig::new(Url::parse("http://localhost:8000/api").unwrap());
        assert_eq!(config.base_url.as_str(), "http://localhost:8000/api/");
    }

    #[test]
    fn test_trailing_slash_is_kept() {
        let config = ApiConfig::new(Url::parse("http://localhost:8000/api/").unwrap());
        assert_eq!(config.base_url.as_str(), "http://localhost:8000/api/");
    }
}
