//! Products: catalog listing with filters, and admin CRUD.

use std::fmt;
use std::str::FromStr;

use boilerparts_core::{CategoryId, Price, ProductId, TagId};
use reqwest::Method;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::client::ApiClient;
use crate::endpoints::detail_path;
use crate::error::ApiError;
use crate::form::FormData;
use crate::models::{Listing, Page, Product};
use crate::request::RequestOptions;

const PRODUCTS: &str = "products/";

// =============================================================================
// Filter
// =============================================================================

/// Catalog sort order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    /// Every sort order, in the order shown to visitors.
    pub const ALL: [Self; 4] = [Self::Newest, Self::PriceAsc, Self::PriceDesc, Self::Name];

    /// Value of the backend's `ordering` parameter.
    #[must_use]
    pub const fn ordering(self) -> &'static str {
        match self {
            Self::Newest => "-created_at",
            Self::PriceAsc => "price",
            Self::PriceDesc => "-price",
            Self::Name => "name",
        }
    }

    /// Value used in storefront query strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Name => "name",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Newest => "Newest",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::Name => "Name",
        }
    }
}

impl fmt::Display for ProductSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sort| sort.as_str() == s)
            .ok_or_else(|| format!("unknown sort order: {s}"))
    }
}

/// Catalog filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Free-text search over name, reference and description.
    pub search: Option<String>,
    pub category: Option<CategoryId>,
    pub tag: Option<TagId>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub sort: ProductSort,
    /// 1-based page number.
    pub page: Option<u32>,
}

impl ProductFilter {
    /// Query pairs understood by the backend.
    #[must_use]
    pub fn query(&self) -> Vec<(String, String)> {
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        RequestOptions::get()
            .with_query_opt("search", search)
            .with_query_opt("categories", self.category)
            .with_query_opt("tags", self.tag)
            .with_query_opt("min_price", self.min_price.map(|p| p.amount()))
            .with_query_opt("max_price", self.max_price.map(|p| p.amount()))
            .with_query("ordering", self.sort.ordering())
            .with_query_opt("page", self.page.filter(|p| *p > 1))
            .query
    }
}

// =============================================================================
// Endpoints
// =============================================================================

impl ApiClient {
    /// List products matching a filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Page<Product>, ApiError> {
        let mut options = RequestOptions::get();
        options.query = filter.query();
        let listing: Listing<Product> = self.request_json(PRODUCTS, options).await?;
        Ok(listing.into())
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 404 if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        self.request_json(&detail_path(PRODUCTS, id), RequestOptions::get())
            .await
    }

    /// Create a product from a multipart form.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 400 if the backend rejects the form.
    #[instrument(skip(self, token, form))]
    pub async fn create_product(
        &self,
        token: &SecretString,
        form: FormData,
    ) -> Result<Product, ApiError> {
        self.request_json(
            PRODUCTS,
            RequestOptions::multipart(Method::POST, form).with_token(Some(token)),
        )
        .await
    }

    /// Update a product from a multipart form.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 400 or 404.
    #[instrument(skip(self, token, form), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &SecretString,
        id: ProductId,
        form: FormData,
    ) -> Result<Product, ApiError> {
        self.request_json(
            &detail_path(PRODUCTS, id),
            RequestOptions::multipart(Method::PATCH, form).with_token(Some(token)),
        )
        .await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 404 if the product does not exist.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(
        &self,
        token: &SecretString,
        id: ProductId,
    ) -> Result<(), ApiError> {
        self.request(
            &detail_path(PRODUCTS, id),
            RequestOptions::delete().with_token(Some(token)),
        )
        .await?;
        Ok(())
    }
}
