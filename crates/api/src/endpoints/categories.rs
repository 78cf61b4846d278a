//! Categories.

use boilerparts_core::CategoryId;
use reqwest::Method;
use secrecy::SecretString;
use tracing::instrument;

use crate::client::ApiClient;
use crate::endpoints::detail_path;
use crate::error::ApiError;
use crate::form::FormData;
use crate::models::{Category, Listing, Page};
use crate::request::RequestOptions;

const CATEGORIES: &str = "categories/";

impl ApiClient {
    /// All categories (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let listing: Listing<Category> = self.get_cached(CATEGORIES).await?;
        Ok(Page::from(listing).results)
    }

    /// Fetch one category.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 404 if the category does not exist.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn get_category(&self, id: CategoryId) -> Result<Category, ApiError> {
        self.request_json(&detail_path(CATEGORIES, id), RequestOptions::get())
            .await
    }

    /// Create a category. The form is multipart so an image can be attached.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 400 if the backend rejects the form.
    #[instrument(skip(self, token, form))]
    pub async fn create_category(
        &self,
        token: &SecretString,
        form: FormData,
    ) -> Result<Category, ApiError> {
        let category = self
            .request_json(
                CATEGORIES,
                RequestOptions::multipart(Method::POST, form).with_token(Some(token)),
            )
            .await?;
        self.invalidate_cache();
        Ok(category)
    }

    /// Update a category.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 400 or 404.
    #[instrument(skip(self, token, form), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        token: &SecretString,
        id: CategoryId,
        form: FormData,
    ) -> Result<Category, ApiError> {
        let category = self
            .request_json(
                &detail_path(CATEGORIES, id),
                RequestOptions::multipart(Method::PATCH, form).with_token(Some(token)),
            )
            .await?;
        self.invalidate_cache();
        Ok(category)
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 404 if the category does not exist.
    #[instrument(skip(self, token), fields(category_id = %id))]
    pub async fn delete_category(
        &self,
        token: &SecretString,
        id: CategoryId,
    ) -> Result<(), ApiError> {
        self.request(
            &detail_path(CATEGORIES, id),
            RequestOptions::delete().with_token(Some(token)),
        )
        .await?;
        self.invalidate_cache();
        Ok(())
    }
}
