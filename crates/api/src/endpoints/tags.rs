//! Tags. Plain JSON, no uploads.

use boilerparts_core::TagId;
use reqwest::Method;
use secrecy::SecretString;
use serde::Serialize;
use tracing::instrument;

use crate::client::ApiClient;
use crate::endpoints::detail_path;
use crate::error::ApiError;
use crate::models::{Listing, Page, Tag};
use crate::request::RequestOptions;

const TAGS: &str = "tags/";

#[derive(Serialize)]
struct TagPayload<'a> {
    name: &'a str,
}

impl ApiClient {
    /// All tags (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_tags(&self) -> Result<Vec<Tag>, ApiError> {
        let listing: Listing<Tag> = self.get_cached(TAGS).await?;
        Ok(Page::from(listing).results)
    }

    /// Create a tag.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 400 if the name is rejected.
    #[instrument(skip(self, token))]
    pub async fn create_tag(&self, token: &SecretString, name: &str) -> Result<Tag, ApiError> {
        let tag = self
            .request_json(
                TAGS,
                RequestOptions::json(Method::POST, &TagPayload { name })?.with_token(Some(token)),
            )
            .await?;
        self.invalidate_cache();
        Ok(tag)
    }

    /// Rename a tag.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 400 or 404.
    #[instrument(skip(self, token), fields(tag_id = %id))]
    pub async fn update_tag(
        &self,
        token: &SecretString,
        id: TagId,
        name: &str,
    ) -> Result<Tag, ApiError> {
        let tag = self
            .request_json(
                &detail_path(TAGS, id),
                RequestOptions::json(Method::PUT, &TagPayload { name })?.with_token(Some(token)),
            )
            .await?;
        self.invalidate_cache();
        Ok(tag)
    }

    /// Delete a tag.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 404 if the tag does not exist.
    #[instrument(skip(self, token), fields(tag_id = %id))]
    pub async fn delete_tag(&self, token: &SecretString, id: TagId) -> Result<(), ApiError> {
        self.request(&detail_path(TAGS, id), RequestOptions::delete().with_token(Some(token)))
            .await?;
        self.invalidate_cache();
        Ok(())
    }
}
