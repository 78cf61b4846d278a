//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use boilerparts_api::{ApiClient, ApiError, Order, OrderFilter, ProductFilter};
use boilerparts_core::{OrderStatus, Price};
use secrecy::SecretString;
use tokio::task::JoinSet;
use tower_sessions::Session;
use tracing::{instrument, warn};

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::Layout;
use crate::routes::orders::OrderRowView;
use crate::state::AppState;

/// Delivered-order pages summed for the revenue card.
const MAX_REVENUE_PAGES: u32 = 50;

/// Orders listed under "recent orders".
const RECENT_ORDERS: usize = 5;

/// Order count for one status.
#[derive(Debug, Clone)]
pub struct StatusCountView {
    pub status: &'static str,
    pub label: &'static str,
    pub count: u64,
}

/// Dashboard metrics.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    pub products: u64,
    pub categories: usize,
    pub orders: u64,
    pub revenue: String,
    /// Revenue was summed over a capped number of pages.
    pub revenue_partial: bool,
    pub by_status: Vec<StatusCountView>,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub metrics: DashboardMetrics,
    pub recent_orders: Vec<OrderRowView>,
    /// Some figures could not be loaded.
    pub degraded: bool,
}

/// Number of orders with `status`.
async fn count_orders(
    api: ApiClient,
    token: SecretString,
    status: OrderStatus,
) -> (OrderStatus, std::result::Result<u64, ApiError>) {
    let filter = OrderFilter {
        status: Some(status),
        ..OrderFilter::default()
    };
    let count = api.list_orders(&token, &filter).await.map(|page| page.count);
    (status, count)
}

/// Sum of delivered order totals, walking the pages.
async fn delivered_revenue(
    api: &ApiClient,
    token: &SecretString,
) -> std::result::Result<(Price, bool), ApiError> {
    let mut total = Price::ZERO;
    let mut page = 1;

    loop {
        let filter = OrderFilter {
            status: Some(OrderStatus::Delivered),
            page: Some(page),
            ..OrderFilter::default()
        };
        let listing = api.list_orders(token, &filter).await?;
        total = total + listing.results.iter().map(|o| o.total_price).sum::<Price>();

        if !listing.has_next() {
            return Ok((total, false));
        }
        if page >= MAX_REVENUE_PAGES {
            return Ok((total, true));
        }
        page += 1;
    }
}

/// Log a figure that could not be loaded. A rejected token is passed on.
fn unavailable(what: &str, e: ApiError) -> std::result::Result<(), ApiError> {
    if e.is_unauthorized() {
        return Err(e);
    }
    warn!(error = %e, what, "Dashboard figure unavailable");
    Ok(())
}

/// Newest orders first.
fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

/// Dashboard page handler.
///
/// Each figure degrades to zero on its own when its backend call fails. An
/// expired token still ends in the login redirect.
#[instrument(skip_all, fields(admin = %auth.admin.username))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
) -> Result<impl IntoResponse> {
    let api = state.api();
    let token = auth.tokens.access();

    let mut counts = JoinSet::new();
    for status in OrderStatus::ALL {
        counts.spawn(count_orders(api.clone(), token.clone(), status));
    }

    let product_filter = ProductFilter::default();
    let order_filter = OrderFilter::default();
    let (products, categories, recent, revenue) = tokio::join!(
        api.list_products(&product_filter),
        api.list_categories(),
        api.list_orders(token, &order_filter),
        delivered_revenue(api, token),
    );

    let mut degraded = false;

    let products = match products {
        Ok(page) => page.count,
        Err(e) => {
            unavailable("products", e)?;
            degraded = true;
            0
        }
    };
    let categories = match categories {
        Ok(list) => list.len(),
        Err(e) => {
            unavailable("categories", e)?;
            degraded = true;
            0
        }
    };
    let (orders, recent_orders) = match recent {
        Ok(page) => (
            page.count,
            newest_first(page.results)
                .iter()
                .take(RECENT_ORDERS)
                .map(OrderRowView::from)
                .collect(),
        ),
        Err(e) => {
            unavailable("orders", e)?;
            degraded = true;
            (0, Vec::new())
        }
    };
    let (revenue, revenue_partial) = match revenue {
        Ok(sum) => sum,
        Err(e) => {
            unavailable("revenue", e)?;
            degraded = true;
            (Price::ZERO, false)
        }
    };

    let mut by_status: Vec<StatusCountView> = Vec::with_capacity(OrderStatus::ALL.len());
    while let Some(joined) = counts.join_next().await {
        let Ok((status, count)) = joined else {
            degraded = true;
            continue;
        };
        let count = match count {
            Ok(count) => count,
            Err(e) => {
                unavailable(status.as_str(), e)?;
                degraded = true;
                0
            }
        };
        by_status.push(StatusCountView {
            status: status.as_str(),
            label: status.label(),
            count,
        });
    }
    by_status.sort_by_key(|view| {
        OrderStatus::ALL
            .iter()
            .position(|s| s.as_str() == view.status)
    });

    Ok(DashboardTemplate {
        layout: Layout::load(&session, &auth.admin, "/").await?,
        metrics: DashboardMetrics {
            products,
            categories,
            orders,
            revenue: revenue.display(),
            revenue_partial,
            by_status,
        },
        recent_orders,
        degraded,
    })
}
