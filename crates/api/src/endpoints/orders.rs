//! Orders: checkout submission, customer history, admin management.

use boilerparts_core::{OrderId, OrderStatus};
use reqwest::Method;
use secrecy::SecretString;
use serde::Serialize;
use tracing::{info, instrument};

use crate::client::ApiClient;
use crate::endpoints::detail_path;
use crate::error::ApiError;
use crate::models::{Listing, NewOrder, Order, Page};
use crate::request::RequestOptions;

const ORDERS: &str = "orders/";
const MY_ORDERS: &str = "orders/mine/";

/// Admin order list filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Search over customer name and phone.
    pub search: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
}

impl OrderFilter {
    /// Query pairs understood by the backend.
    #[must_use]
    pub fn query(&self) -> Vec<(String, String)> {
        RequestOptions::get()
            .with_query_opt("status", self.status)
            .with_query_opt(
                "search",
                self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            )
            .with_query_opt("page", self.page.filter(|p| *p > 1))
            .query
    }
}

#[derive(Serialize)]
struct StatusUpdate {
    status: OrderStatus,
}

impl ApiClient {
    /// Submit an order. A token links the order to the customer's account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 400 if the backend rejects the order
    /// (unknown product, inactive wilaya...).
    #[instrument(skip(self, token, order), fields(lines = order.items.len()))]
    pub async fn create_order(
        &self,
        token: Option<&SecretString>,
        order: &NewOrder,
    ) -> Result<Order, ApiError> {
        let created: Order = self
            .request_json(ORDERS, RequestOptions::json(Method::POST, order)?.with_token(token))
            .await?;
        info!(order_id = %created.id, "Order submitted");
        Ok(created)
    }

    /// List orders (staff only).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 401/403 for non-staff tokens.
    #[instrument(skip(self, token))]
    pub async fn list_orders(
        &self,
        token: &SecretString,
        filter: &OrderFilter,
    ) -> Result<Page<Order>, ApiError> {
        let mut options = RequestOptions::get().with_token(Some(token));
        options.query = filter.query();
        let listing: Listing<Order> = self.request_json(ORDERS, options).await?;
        Ok(listing.into())
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 404 if the order does not exist.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(&self, token: &SecretString, id: OrderId) -> Result<Order, ApiError> {
        self.request_json(
            &detail_path(ORDERS, id),
            RequestOptions::get().with_token(Some(token)),
        )
        .await
    }

    /// Orders of the token's owner, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 401 if the token is invalid.
    #[instrument(skip(self, token))]
    pub async fn my_orders(&self, token: &SecretString) -> Result<Vec<Order>, ApiError> {
        let listing: Listing<Order> = self
            .request_json(MY_ORDERS, RequestOptions::get().with_token(Some(token)))
            .await?;
        Ok(Page::from(listing).results)
    }

    /// Change an order's status.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 400 or 404.
    #[instrument(skip(self, token), fields(order_id = %id, status = %status))]
    pub async fn update_order_status(
        &self,
        token: &SecretString,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        self.request_json(
            &detail_path(ORDERS, id),
            RequestOptions::json(Method::PATCH, &StatusUpdate { status })?.with_token(Some(token)),
        )
        .await
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 404 if the order does not exist.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn delete_order(&self, token: &SecretString, id: OrderId) -> Result<(), ApiError> {
        self.request(&detail_path(ORDERS, id), RequestOptions::delete().with_token(Some(token)))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_filter_query() {
        let filter = OrderFilter {
            status: Some(OrderStatus::Shipped),
            search: Some(" ".into()),
            page: Some(3),
        };
        assert_eq!(
            filter.query(),
            vec![
                ("status".to_string(), "shipped".to_string()),
                ("page".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_order_filter() {
        assert!(OrderFilter::default().query().is_empty());
    }
}
