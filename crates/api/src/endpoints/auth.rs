//! Authentication: JWT login, registration, refresh, profile.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{Credentials, Registration, UserProfile};
use crate::request::RequestOptions;
use crate::tokens::{AuthTokens, TokenStore};

const LOGIN: &str = "auth/login/";
const REGISTER: &str = "auth/register/";
const REFRESH: &str = "auth/token/refresh/";
const ME: &str = "auth/me/";

/// Token pair as returned by the backend.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

impl From<TokenResponse> for AuthTokens {
    fn from(response: TokenResponse) -> Self {
        Self::new(response.access, response.refresh)
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

impl ApiClient {
    /// Log in and persist the issued tokens.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 400/401 for bad credentials, or a
    /// token storage error if the tokens cannot be saved.
    #[instrument(skip(self, credentials, store), fields(username = %credentials.username))]
    pub async fn login(
        &self,
        credentials: &Credentials,
        store: &impl TokenStore,
    ) -> Result<AuthTokens, ApiError> {
        let response: TokenResponse = self
            .request_json(LOGIN, RequestOptions::json(Method::POST, credentials)?)
            .await?;
        let tokens = AuthTokens::from(response);
        store.save(&tokens).await?;
        info!("Logged in");
        Ok(tokens)
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 400 and the backend's field errors
    /// if the registration is rejected.
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        self.request(REGISTER, RequestOptions::json(Method::POST, registration)?)
            .await?;
        info!("Account registered");
        Ok(())
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotAuthenticated`] if no refresh token is stored,
    /// or [`ApiError::Status`] if the backend rejects it.
    #[instrument(skip(self, store))]
    pub async fn refresh(&self, store: &impl TokenStore) -> Result<AuthTokens, ApiError> {
        let tokens = store.load().await?.ok_or(ApiError::NotAuthenticated)?;
        let refresh = tokens.refresh().ok_or(ApiError::NotAuthenticated)?;

        let response: TokenResponse = self
            .request_json(
                REFRESH,
                RequestOptions::json(
                    Method::POST,
                    &RefreshRequest {
                        refresh: refresh.expose_secret(),
                    },
                )?,
            )
            .await?;

        // Rotating backends return a new refresh token; others only an access token.
        let refreshed = match response.refresh {
            Some(_) => AuthTokens::from(response),
            None => tokens.with_access(response.access),
        };
        store.save(&refreshed).await?;
        Ok(refreshed)
    }

    /// Profile of the token's owner.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 401 if the token is invalid or expired.
    #[instrument(skip(self, token))]
    pub async fn me(&self, token: &SecretString) -> Result<UserProfile, ApiError> {
        self.request_json(ME, RequestOptions::get().with_token(Some(token)))
            .await
    }

    /// Profile of the stored user, refreshing the access token once if it
    /// has expired.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotAuthenticated`] if nothing is stored, or the
    /// backend error if the refresh fails too.
    #[instrument(skip(self, store))]
    pub async fn current_user(&self, store: &impl TokenStore) -> Result<UserProfile, ApiError> {
        let tokens = store.load().await?.ok_or(ApiError::NotAuthenticated)?;
        match self.me(tokens.access()).await {
            Err(e) if e.is_unauthorized() && tokens.refresh().is_some() => {
                let refreshed = self.refresh(store).await?;
                self.me(refreshed.access()).await
            }
            other => other,
        }
    }

    /// Forget the stored tokens.
    ///
    /// The backend keeps no server-side session for JWTs, so this is local.
    ///
    /// # Errors
    ///
    /// Returns a token storage error if the store cannot be cleared.
    #[instrument(skip(self, store))]
    pub async fn logout(&self, store: &impl TokenStore) -> Result<(), ApiError> {
        store.clear().await
    }
}
