//! Wilayas and their delivery prices.

use boilerparts_core::WilayaId;
use reqwest::Method;
use secrecy::SecretString;
use tracing::{info, instrument};

use crate::client::ApiClient;
use crate::endpoints::detail_path;
use crate::error::ApiError;
use crate::models::{Listing, Page, Wilaya, WilayaPrices};
use crate::request::RequestOptions;

const WILAYAS: &str = "wilayas/";

impl ApiClient {
    /// All wilayas ordered by code (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_wilayas(&self) -> Result<Vec<Wilaya>, ApiError> {
        let listing: Listing<Wilaya> = self.get_cached(WILAYAS).await?;
        let mut wilayas = Page::from(listing).results;
        wilayas.sort_by_key(|w| w.code);
        Ok(wilayas)
    }

    /// Look up one wilaya in the cached list.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be fetched.
    pub async fn find_wilaya(&self, id: WilayaId) -> Result<Option<Wilaya>, ApiError> {
        Ok(self.list_wilayas().await?.into_iter().find(|w| w.id == id))
    }

    /// Set a wilaya's home and desk delivery prices.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 400 if a price is rejected.
    #[instrument(skip(self, token, prices), fields(wilaya_id = %id))]
    pub async fn update_wilaya_prices(
        &self,
        token: &SecretString,
        id: WilayaId,
        prices: &WilayaPrices,
    ) -> Result<Wilaya, ApiError> {
        let wilaya = self
            .request_json(
                &detail_path(WILAYAS, id),
                RequestOptions::json(Method::PATCH, prices)?.with_token(Some(token)),
            )
            .await?;
        self.invalidate_cache();
        info!("Wilaya prices updated");
        Ok(wilaya)
    }
}
