//! Backend REST client.
//!
//! Every backend call goes through [`ApiClient::request`]. Reference data
//! that changes rarely (categories, tags, wilayas) is cached with `moka`
//! and invalidated by the admin after each mutation.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::request::{ApiBody, RequestBody, RequestOptions, classify_body};

const JSON_MIME: &str = "application/json";

/// Maximum number of cached responses.
const CACHE_CAPACITY: u64 = 256;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the backend REST API.
///
/// Cheap to clone; clones share the connection pool and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    cache: Cache<String, serde_json::Value>,
}

impl ApiClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// Base URL of the REST API.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve an endpoint below the base URL and append the query pairs.
    ///
    /// A leading `/` on the endpoint is ignored so that `"/products/"` and
    /// `"products/"` resolve to the same URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidEndpoint`] if the endpoint cannot be joined.
    pub fn endpoint_url(
        &self,
        endpoint: &str,
        query: &[(String, String)],
    ) -> Result<Url, ApiError> {
        let mut url = self
            .inner
            .base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|source| ApiError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(url)
    }

    /// Send a request to `endpoint`.
    ///
    /// The JSON content type is sent unless the body is multipart (reqwest
    /// then sets the multipart boundary itself). A bearer token is attached
    /// when the options carry one.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] on transport failures
    /// - [`ApiError::Status`] for any non-2xx response
    /// - [`ApiError::Parse`] if a JSON response does not parse
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn request(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<ApiBody, ApiError> {
        let RequestOptions {
            method,
            body,
            token,
            query,
        } = options;

        let url = self.endpoint_url(endpoint, &query)?;
        let mut builder = self
            .inner
            .http
            .request(method.clone(), url)
            .header(ACCEPT, JSON_MIME);

        if !body.is_multipart() {
            builder = builder.header(CONTENT_TYPE, JSON_MIME);
        }

        if let Some(token) = token {
            builder = builder.bearer_auth(token.expose_secret());
        }

        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(serde_json::to_vec(&value)?),
            RequestBody::Multipart(form) => builder.multipart(form.into_multipart()?),
        };

        let response = builder.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            // A broken error body must not hide the status.
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    warn!(status = %status, error = %e, "Failed to read error response body");
                    String::new()
                }
            };
            warn!(
                status = %status,
                body = %text.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(ApiError::status(status, &text));
        }

        let text = response.text().await?;
        classify_body(&method, status, content_type.as_deref(), text)
    }

    /// Send a request and deserialize the JSON response.
    ///
    /// # Errors
    ///
    /// As [`request`](Self::request), plus [`ApiError::UnexpectedBody`] if
    /// the response is not JSON.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.request(endpoint, options).await?.into_json()
    }

    /// GET a JSON document through the cache.
    ///
    /// Only used for unauthenticated reference data, so the cache key is the
    /// endpoint alone.
    pub(crate) async fn get_cached<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<T, ApiError> {
        if let Some(value) = self.inner.cache.get(endpoint).await {
            debug!(endpoint, "Cache hit");
            return Ok(serde_json::from_value(value)?);
        }

        let body = self.request(endpoint, RequestOptions::get()).await?;
        let ApiBody::Json(value) = body else {
            return body.into_json();
        };

        self.inner
            .cache
            .insert(endpoint.to_string(), value.clone())
            .await;

        Ok(serde_json::from_value(value)?)
    }

    /// Drop every cached response.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(&ApiConfig::new(
            Url::parse("http://localhost:8000/api/").unwrap(),
        ))
        .unwrap()
    }

    #[test]
    fn test_endpoint_url_strips_leading_slash() {
        let client = client();
        assert_eq!(
            client.endpoint_url("/products/", &[]).unwrap().as_str(),
            "http://localhost:8000/api/products/"
        );
        assert_eq!(
            client.endpoint_url("products/12/", &[]).unwrap().as_str(),
            "http://localhost:8000/api/products/12/"
        );
    }

    #[test]
    fn test_endpoint_url_appends_query() {
        let client = client();
        let url = client
            .endpoint_url(
                "products/",
                &[
                    ("search".into(), "vanne 3 voies".into()),
                    ("page".into(), "2".into()),
                ],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/products/?search=vanne+3+voies&page=2"
        );
    }

    #[test]
    fn test_endpoint_url_without_query_has_no_question_mark() {
        let url = client().endpoint_url("tags/", &[]).unwrap();
        assert!(url.query().is_none());
    }
}
