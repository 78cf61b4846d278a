//! Order management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use boilerparts_api::{Order, OrderFilter};
use boilerparts_core::{OrderId, OrderStatus};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::Flash;
use crate::routes::{ChoiceView, Layout, flash_and_redirect, mutation_error};
use crate::state::AppState;

/// Backend page size for orders.
const PAGE_SIZE: u32 = 20;

// =============================================================================
// Views
// =============================================================================

/// Order row for tables.
#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub id: OrderId,
    pub date: String,
    pub customer: String,
    pub phone: String,
    pub wilaya: String,
    pub total: String,
    pub status: &'static str,
    pub status_label: &'static str,
}

impl From<&Order> for OrderRowView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            date: order
                .created_at
                .map(|at| at.format("%d/%m/%Y %H:%M").to_string())
                .unwrap_or_default(),
            customer: order.full_name.clone(),
            phone: order.phone.clone(),
            wilaya: order.wilaya.clone(),
            total: order.total_price.display(),
            status: order.status.as_str(),
            status_label: order.status.label(),
        }
    }
}

/// Order line for the detail page.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub product_url: Option<String>,
    pub name: String,
    pub price: String,
    pub quantity: u32,
    pub total: String,
}

/// Full order for the detail page.
#[derive(Debug, Clone)]
pub struct OrderDetailView {
    pub row: OrderRowView,
    pub email: Option<String>,
    pub commune: Option<String>,
    pub address: Option<String>,
    pub delivery: &'static str,
    pub note: Option<String>,
    pub lines: Vec<OrderLineView>,
    pub subtotal: String,
    pub shipping: String,
    pub is_final: bool,
    pub statuses: Vec<ChoiceView>,
}

impl From<&Order> for OrderDetailView {
    fn from(order: &Order) -> Self {
        Self {
            row: OrderRowView::from(order),
            email: order.email.clone(),
            commune: order.commune.clone(),
            address: order.address.clone(),
            delivery: order.delivery_type.label(),
            note: order.note.clone(),
            lines: order
                .items
                .iter()
                .map(|line| OrderLineView {
                    product_url: line.product.map(|id| format!("/products/{id}/edit")),
                    name: line.product_name.clone(),
                    price: line.price.display(),
                    quantity: line.quantity,
                    total: line.line_total().display(),
                })
                .collect(),
            subtotal: order.subtotal().display(),
            shipping: order.shipping_price.display(),
            is_final: order.status.is_final(),
            statuses: status_choices(Some(order.status)),
        }
    }
}

fn status_choices(selected: Option<OrderStatus>) -> Vec<ChoiceView> {
    OrderStatus::ALL
        .iter()
        .map(|status| ChoiceView {
            value: status.as_str().to_string(),
            label: status.label().to_string(),
            selected: selected == Some(*status),
        })
        .collect()
}

// =============================================================================
// Queries and Forms
// =============================================================================

/// Order list query parameters. Unknown statuses and pages are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub page: String,
}

impl OrdersQuery {
    #[must_use]
    pub fn to_filter(&self) -> OrderFilter {
        OrderFilter {
            status: self.status.parse().ok(),
            search: Some(self.q.trim().to_string()).filter(|q| !q.is_empty()),
            page: self.page.parse().ok().filter(|p| *p > 0),
        }
    }
}

/// Listing URL for a filter and page.
fn page_url(filter: &OrderFilter, page: u32) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    if let Some(status) = filter.status {
        query.append_pair("status", status.as_str());
    }
    if let Some(search) = &filter.search {
        query.append_pair("q", search);
    }
    if page > 1 {
        query.append_pair("page", &page.to_string());
    }
    let query = query.finish();
    if query.is_empty() {
        "/orders".to_string()
    } else {
        format!("/orders?{query}")
    }
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: OrderStatus,
}

// =============================================================================
// Templates
// =============================================================================

/// Orders list page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderRowView>,
    pub statuses: Vec<ChoiceView>,
    pub search: String,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
    /// Backend failure shown above the table.
    pub error: Option<String>,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub layout: Layout,
    pub order: OrderDetailView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Orders list page handler.
#[instrument(skip(state, session, auth))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    Query(query): Query<OrdersQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.to_filter();
    let page = filter.page.unwrap_or(1);

    let (orders, total, total_pages, has_next, error) =
        match state.api().list_orders(auth.tokens.access(), &filter).await {
            Ok(listing) => (
                listing.results.iter().map(OrderRowView::from).collect(),
                listing.count,
                listing.total_pages(PAGE_SIZE),
                listing.has_next(),
                None,
            ),
            Err(e) if e.is_unauthorized() => return Err(e.into()),
            Err(e) => {
                tracing::error!("Failed to fetch orders: {e}");
                (
                    Vec::new(),
                    0,
                    1,
                    false,
                    Some("Orders could not be loaded from the backend.".to_string()),
                )
            }
        };

    Ok(OrdersIndexTemplate {
        layout: Layout::load(&session, &auth.admin, "/orders").await?,
        orders,
        statuses: status_choices(filter.status),
        search: filter.search.clone().unwrap_or_default(),
        total,
        page,
        total_pages,
        prev_url: (page > 1).then(|| page_url(&filter, page - 1)),
        next_url: has_next.then(|| page_url(&filter, page + 1)),
        error,
    })
}

/// Order detail page handler.
#[instrument(skip(state, session, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let order = state.api().get_order(auth.tokens.access(), id).await?;

    Ok(OrderShowTemplate {
        layout: Layout::load(&session, &auth.admin, "/orders").await?,
        order: OrderDetailView::from(&order),
    })
}

/// Change an order's status.
#[instrument(skip(state, session, auth, headers))]
pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    headers: HeaderMap,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Response> {
    let back = format!("/orders/{id}");
    let flash = match state
        .api()
        .update_order_status(auth.tokens.access(), id, form.status)
        .await
    {
        Ok(order) => {
            info!(order_id = %id, status = %order.status, "Order status changed");
            Flash::success(format!("Order #{id} is now {}.", order.status.label()))
        }
        Err(e) => Flash::error(mutation_error(e, "order")?),
    };

    flash_and_redirect(&session, &headers, flash, &back).await
}

/// Delete an order.
#[instrument(skip(state, session, auth, headers))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    headers: HeaderMap,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    match state.api().delete_order(auth.tokens.access(), id).await {
        Ok(()) => {
            info!(order_id = %id, "Order deleted");
            flash_and_redirect(
                &session,
                &headers,
                Flash::success(format!("Order #{id} deleted.")),
                "/orders",
            )
            .await
        }
        Err(e) => {
            let message = mutation_error(e, "order")?;
            flash_and_redirect(&session, &headers, Flash::error(message), &format!("/orders/{id}"))
                .await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::extract::Query;
    use axum::http::Uri;
    use boilerparts_api::OrderLine;
    use boilerparts_core::{DeliveryType, Price, ProductId};

    use super::*;

    fn order() -> Order {
        Order {
            id: OrderId::new(41),
            full_name: "Yacine Mansouri".to_string(),
            phone: "0661 22 33 44".to_string(),
            email: None,
            wilaya: "Oran".to_string(),
            commune: Some("Bir El Djir".to_string()),
            address: None,
            delivery_type: DeliveryType::Desk,
            shipping_price: Price::from_dinars(450),
            total_price: Price::from_dinars(9_450),
            status: OrderStatus::Shipped,
            note: None,
            items: vec![
                OrderLine {
                    product: Some(ProductId::new(8)),
                    product_name: "Thermocouple".to_string(),
                    price: Price::from_dinars(1_500),
                    quantity: 2,
                },
                OrderLine {
                    product: None,
                    product_name: "Discontinued gasket".to_string(),
                    price: Price::from_dinars(6_000),
                    quantity: 1,
                },
            ],
            created_at: None,
        }
    }

    #[test]
    fn test_query_parsing_is_lenient() {
        let uri: Uri = "/orders?status=bogus&q=%20Oran%20&page=0".parse().unwrap();
        let Query(query) = Query::<OrdersQuery>::try_from_uri(&uri).unwrap();
        let filter = query.to_filter();
        assert_eq!(filter.status, None);
        assert_eq!(filter.search.as_deref(), Some("Oran"));
        assert_eq!(filter.page, None);
    }

    #[test]
    fn test_page_url_keeps_filter() {
        let filter = OrderFilter {
            status: Some(OrderStatus::Pending),
            search: Some("0550".to_string()),
            page: None,
        };
        assert_eq!(page_url(&filter, 2), "/orders?status=pending&q=0550&page=2");
        assert_eq!(page_url(&OrderFilter::default(), 1), "/orders");
    }

    #[test]
    fn test_detail_view() {
        let view = OrderDetailView::from(&order());
        assert_eq!(view.row.status, "shipped");
        assert_eq!(view.delivery, "Desk pick-up");
        assert_eq!(view.subtotal, "9 000.00 DA");
        assert_eq!(view.lines[0].product_url.as_deref(), Some("/products/8/edit"));
        assert!(view.lines[1].product_url.is_none());
        assert!(view.statuses.iter().any(|s| s.selected && s.value == "shipped"));
        assert!(!view.is_final);
    }
}
