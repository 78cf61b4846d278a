//! JWT persistence.
//!
//! The backend issues an access/refresh token pair on login. Whoever owns
//! the visitor's durable storage implements [`TokenStore`]; the client
//! saves tokens on login/refresh and clears them on logout.

use std::future::Future;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_sessions::Session;

use crate::error::ApiError;

/// Session key under which [`Session`] stores the token pair.
pub const SESSION_TOKENS_KEY: &str = "auth_tokens";

/// An access/refresh token pair.
#[derive(Debug, Clone)]
pub struct AuthTokens {
    access: SecretString,
    refresh: Option<SecretString>,
}

impl AuthTokens {
    /// Create a token pair.
    #[must_use]
    pub fn new(access: impl Into<String>, refresh: Option<String>) -> Self {
        Self {
            access: SecretString::from(access.into()),
            refresh: refresh.map(SecretString::from),
        }
    }

    /// The bearer token for API calls.
    #[must_use]
    pub const fn access(&self) -> &SecretString {
        &self.access
    }

    /// The refresh token, if the backend issued one.
    #[must_use]
    pub const fn refresh(&self) -> Option<&SecretString> {
        self.refresh.as_ref()
    }

    /// Replace the access token, keeping the refresh token.
    #[must_use]
    pub fn with_access(self, access: impl Into<String>) -> Self {
        Self {
            access: SecretString::from(access.into()),
            refresh: self.refresh,
        }
    }
}

/// Serialized form of [`AuthTokens`].
///
/// Kept private so that secrets only leave `SecretString` at the storage
/// boundary.
#[derive(Clone, Serialize, Deserialize)]
struct StoredTokens {
    access: String,
    refresh: Option<String>,
}

impl From<&AuthTokens> for StoredTokens {
    fn from(tokens: &AuthTokens) -> Self {
        Self {
            access: tokens.access.expose_secret().to_string(),
            refresh: tokens.refresh.as_ref().map(|r| r.expose_secret().to_string()),
        }
    }
}

impl From<StoredTokens> for AuthTokens {
    fn from(stored: StoredTokens) -> Self {
        Self::new(stored.access, stored.refresh)
    }
}

/// Durable storage for the token pair.
pub trait TokenStore: Send + Sync {
    /// Load the stored tokens, if any.
    fn load(&self) -> impl Future<Output = Result<Option<AuthTokens>, ApiError>> + Send;

    /// Persist tokens, replacing any previous pair.
    fn save(&self, tokens: &AuthTokens) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Forget the stored tokens.
    fn clear(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl TokenStore for Session {
    async fn load(&self) -> Result<Option<AuthTokens>, ApiError> {
        self.get::<StoredTokens>(SESSION_TOKENS_KEY)
            .await
            .map(|stored| stored.map(AuthTokens::from))
            .map_err(|e| ApiError::TokenStorage(e.to_string()))
    }

    async fn save(&self, tokens: &AuthTokens) -> Result<(), ApiError> {
        self.insert(SESSION_TOKENS_KEY, StoredTokens::from(tokens))
            .await
            .map_err(|e| ApiError::TokenStorage(e.to_string()))
    }

    async fn clear(&self) -> Result<(), ApiError> {
        self.remove::<StoredTokens>(SESSION_TOKENS_KEY)
            .await
            .map(|_| ())
            .map_err(|e| ApiError::TokenStorage(e.to_string()))
    }
}

/// In-process token store, for tools and tests.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    inner: Arc<RwLock<Option<StoredTokens>>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<AuthTokens>, ApiError> {
        Ok(self.inner.read().await.clone().map(AuthTokens::from))
    }

    async fn save(&self, tokens: &AuthTokens) -> Result<(), ApiError> {
        *self.inner.write().await = Some(StoredTokens::from(tokens));
        Ok(())
    }

    async fn clear(&self) -> Result<(), ApiError> {
        *self.inner.write().await = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert!(store.load().await.unwrap().is_none());

        store
            .save(&AuthTokens::new("access-1", Some("refresh-1".into())))
            .await
            .unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.access().expose_secret(), "access-1");
        assert_eq!(
            loaded.refresh().map(|r| r.expose_secret()),
            Some("refresh-1")
        );

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[test]
    fn test_with_access_keeps_refresh() {
        let tokens = AuthTokens::new("old", Some("r".into())).with_access("new");
        assert_eq!(tokens.access().expose_secret(), "new");
        assert!(tokens.refresh().is_some());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let tokens = AuthTokens::new("super-secret-access", None);
        assert!(!format!("{tokens:?}").contains("super-secret-access"));
    }
}
