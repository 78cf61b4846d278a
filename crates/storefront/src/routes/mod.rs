//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Home page
//!
//! # Catalog
//! GET  /products                 - Product listing with filters
//! GET  /products/{id}            - Product detail
//!
//! # Cart (HTMX fragments, plain redirects without HTMX)
//! GET  /cart                     - Cart page
//! GET  /cart/panel               - Side panel fragment
//! GET  /cart/count               - Cart count badge fragment
//! POST /cart/add                 - Add to cart (opens the panel)
//! POST /cart/update              - Set a line's quantity
//! POST /cart/remove              - Remove a line
//! POST /cart/clear               - Empty the cart
//! POST /cart/open                - Open the side panel
//! POST /cart/close               - Close the side panel
//!
//! # Checkout wizard
//! GET  /checkout                 - Step 1: contact details
//! POST /checkout                 - Save contact details
//! GET  /checkout/delivery        - Step 2: wilaya, commune, address, delivery type
//! POST /checkout/delivery        - Save delivery details
//! GET  /checkout/shipping-quote  - Shipping price fragment for a wilaya (HTMX)
//! GET  /checkout/review          - Step 3: review
//! POST /checkout/confirm         - Submit the order (rate limited)
//! GET  /checkout/success         - Order confirmation
//!
//! # Auth (rate limited)
//! GET  /auth/login               - Login page
//! POST /auth/login               - Login action
//! GET  /auth/register            - Register page
//! POST /auth/register            - Register action
//! POST /auth/logout              - Logout action
//!
//! # Account (requires auth)
//! GET  /account                  - Profile and order history
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};
use boilerparts_core::Cart;

use crate::middleware::{auth_rate_limiter, checkout_rate_limiter};
use crate::models::CurrentCustomer;
use crate::state::AppState;

// =============================================================================
// Shared Views
// =============================================================================

/// Data every full page needs for the header and footer.
#[derive(Clone)]
pub struct LayoutView {
    pub store_name: String,
    pub store_phone: Option<String>,
    pub customer_name: Option<String>,
    pub cart_count: u32,
}

impl LayoutView {
    /// Build the layout from the visitor's state.
    #[must_use]
    pub fn new(state: &AppState, customer: Option<&CurrentCustomer>, cart: &Cart) -> Self {
        let store = &state.config().store;
        Self {
            store_name: store.name.clone(),
            store_phone: store.phone.clone(),
            customer_name: customer.map(|c| c.display_name.clone()),
            cart_count: cart.total_items(),
        }
    }
}

/// Whether the request was issued by htmx.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("hx-request")
        .is_some_and(|v| v.as_bytes() == b"true")
}

// =============================================================================
// Routers
// =============================================================================

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/panel", get(cart::panel))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/open", post(cart::open))
        .route("/close", post(cart::close))
}

/// Create the checkout wizard router.
pub fn checkout_routes() -> Router<AppState> {
    let confirm = Router::new()
        .route("/confirm", post(checkout::confirm))
        .layer(checkout_rate_limiter());

    Router::new()
        .route("/", get(checkout::contact_page).post(checkout::submit_contact))
        .route(
            "/delivery",
            get(checkout::delivery_page).post(checkout::submit_delivery),
        )
        .route("/shipping-quote", get(checkout::shipping_quote))
        .route("/review", get(checkout::review_page))
        .route("/success", get(checkout::success))
        .merge(confirm)
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/account", get(account::index))
        .nest("/auth", auth_routes())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("hx-request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }
}
