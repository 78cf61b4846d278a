//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use boilerparts_api::Order;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::LayoutView;
use crate::services::cart as cart_service;
use crate::state::AppState;

/// Profile display data for templates.
#[derive(Clone)]
pub struct ProfileView {
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub number: String,
    pub date: Option<String>,
    pub status: &'static str,
    pub is_final: bool,
    pub item_count: u32,
    pub wilaya: String,
    pub delivery: &'static str,
    pub total: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            number: order.id.to_string(),
            date: order
                .created_at
                .map(|at| at.format("%d/%m/%Y").to_string()),
            status: order.status.label(),
            is_final: order.status.is_final(),
            item_count: order.items.iter().map(|line| line.quantity).sum(),
            wilaya: order.wilaya.clone(),
            delivery: order.delivery_type.label(),
            total: order.total_price.display(),
        }
    }
}

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub layout: LayoutView,
    pub profile: ProfileView,
    pub orders: Vec<OrderView>,
}

/// Display the profile and order history.
///
/// The profile is fetched fresh so edits made on the backend show up
/// without logging in again.
#[instrument(skip_all, fields(customer = %auth.customer.username))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAuth,
) -> Result<impl IntoResponse> {
    let token = auth.tokens.access();
    let (profile, orders) = tokio::join!(state.api().me(token), state.api().my_orders(token));
    let profile = profile?;
    let mut orders = orders?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let cart = cart_service::load(&session).await?;

    Ok(AccountIndexTemplate {
        layout: LayoutView::new(&state, Some(&auth.customer), &cart),
        profile: ProfileView {
            username: profile.username.clone(),
            name: profile.display_name(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
        },
        orders: orders.iter().map(OrderView::from).collect(),
    })
}
