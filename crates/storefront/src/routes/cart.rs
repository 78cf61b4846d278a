//! Cart route handlers.
//!
//! The cart lives in the session. Side-panel operations answer HTMX requests
//! with fragments; the same endpoints redirect to `/cart` for plain form posts.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use boilerparts_core::{Cart, CartItem, MAX_QUANTITY, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::{LayoutView, is_htmx};
use crate::services::cart as cart_service;
use crate::state::AppState;

/// Fired after a product is added; the layout reloads the panel.
const CART_UPDATED: &str = "cart-updated";

/// Fired by panel operations that already return the panel; only the badge reloads.
const CART_COUNT_CHANGED: &str = "cart-count-changed";

// =============================================================================
// Views
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub price: String,
    pub quantity: u32,
    pub line_total: String,
    /// Quantity submitted by the "+" button.
    pub increment: u32,
    /// Quantity submitted by the "-" button (0 removes the line).
    pub decrement: u32,
    pub at_max: bool,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            image: item.image.clone(),
            price: item.price.display(),
            quantity: item.quantity,
            line_total: item.line_total().display(),
            increment: (item.quantity + 1).min(MAX_QUANTITY),
            decrement: item.quantity.saturating_sub(1),
            at_max: item.quantity >= MAX_QUANTITY,
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub subtotal: String,
    pub item_count: u32,
    pub is_open: bool,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().iter().map(CartLineView::from).collect(),
            subtotal: cart.total_price().display(),
            item_count: cart.total_items(),
            is_open: cart.is_open(),
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: LayoutView,
    pub cart: CartView,
}

/// Cart side panel fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_panel.html")]
pub struct CartPanelTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Inline error fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_error.html")]
pub struct CartErrorTemplate {
    pub message: String,
}

/// Inline error for an HTMX add; shown in the side panel instead of the badge.
fn error_fragment(message: &str) -> Response {
    (
        AppendHeaders([("HX-Retarget", "#cart-panel"), ("HX-Reswap", "innerHTML")]),
        CartErrorTemplate {
            message: message.to_string(),
        },
    )
        .into_response()
}

/// Answer a panel operation: the panel fragment for HTMX, a redirect otherwise.
fn panel_response(headers: &HeaderMap, cart: &Cart) -> Response {
    if !is_htmx(headers) {
        return Redirect::to("/cart").into_response();
    }

    (
        AppendHeaders([("HX-Trigger", CART_COUNT_CHANGED)]),
        CartPanelTemplate {
            cart: CartView::from(cart),
        },
    )
        .into_response()
}

// =============================================================================
// Pages and Fragments
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Result<impl IntoResponse> {
    let cart = cart_service::load(&session).await?;

    Ok(CartShowTemplate {
        layout: LayoutView::new(&state, customer.as_ref(), &cart),
        cart: CartView::from(&cart),
    })
}

/// Cart side panel (HTMX).
#[instrument(skip(session))]
pub async fn panel(session: Session) -> Result<impl IntoResponse> {
    let cart = cart_service::load(&session).await?;
    Ok(CartPanelTemplate {
        cart: CartView::from(&cart),
    })
}

/// Cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<impl IntoResponse> {
    let cart = cart_service::load(&session).await?;
    Ok(CartCountTemplate {
        count: cart.total_items(),
    })
}

// =============================================================================
// Mutations
// =============================================================================

/// Add a product to the cart and open the side panel.
///
/// The product is re-read from the backend so the name, price and stock are
/// current. Returns the count badge with an HTMX trigger so the layout
/// refreshes the panel.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let htmx = is_htmx(&headers);

    let product = match state.api().get_product(form.product_id).await {
        Ok(product) => product,
        Err(e) if htmx => {
            warn!(error = %e, product_id = %form.product_id, "Failed to load product for cart");
            return Ok(error_fragment("This product is not available right now."));
        }
        Err(e) => return Err(e.into()),
    };

    if !product.is_active || !product.in_stock() {
        if htmx {
            return Ok(error_fragment("This product is out of stock."));
        }
        return Ok(Redirect::to(&format!("/products/{}", product.id)).into_response());
    }

    let stock = u32::try_from(product.stock).unwrap_or(0);
    let already = {
        let cart = cart_service::load(&session).await?;
        cart.get(product.id).map_or(0, |line| line.quantity)
    };
    let quantity = form
        .quantity
        .unwrap_or(1)
        .min(stock.saturating_sub(already));

    if quantity == 0 {
        if htmx {
            return Ok(error_fragment(
                "You already have all available units in your cart.",
            ));
        }
        return Ok(Redirect::to("/cart").into_response());
    }

    let item = CartItem::new(
        product.id,
        product.name.clone(),
        product.price,
        product.primary_image().map(str::to_string),
    )
    .with_quantity(quantity);

    let cart = cart_service::update(&session, |cart| {
        cart.add(item);
        cart.open();
    })
    .await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        &[
            ("product_id", product.id.to_string()),
            ("quantity", quantity.to_string()),
        ],
    );

    if !htmx {
        return Ok(Redirect::to("/cart").into_response());
    }

    Ok((
        AppendHeaders([("HX-Trigger", CART_UPDATED)]),
        CartCountTemplate {
            count: cart.total_items(),
        },
    )
        .into_response())
}

/// Set a line's quantity; 0 removes it.
#[instrument(skip(session, headers))]
pub async fn update(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let cart = cart_service::update(&session, |cart| {
        cart.update_quantity(form.product_id, form.quantity);
    })
    .await?;

    Ok(panel_response(&headers, &cart))
}

/// Remove a line.
#[instrument(skip(session, headers))]
pub async fn remove(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let cart = cart_service::update(&session, |cart| cart.remove(form.product_id)).await?;
    Ok(panel_response(&headers, &cart))
}

/// Empty the cart.
#[instrument(skip(session, headers))]
pub async fn clear(session: Session, headers: HeaderMap) -> Result<Response> {
    let cart = cart_service::update(&session, Cart::clear).await?;
    Ok(panel_response(&headers, &cart))
}

/// Show the side panel.
#[instrument(skip(session, headers))]
pub async fn open(session: Session, headers: HeaderMap) -> Result<Response> {
    let cart = cart_service::update(&session, Cart::open).await?;
    Ok(panel_response(&headers, &cart))
}

/// Hide the side panel.
#[instrument(skip(session, headers))]
pub async fn close(session: Session, headers: HeaderMap) -> Result<Response> {
    let cart = cart_service::update(&session, Cart::close).await?;
    Ok(panel_response(&headers, &cart))
}

#[cfg(test)]
mod tests {
    use boilerparts_core::Price;

    use super::*;

    #[test]
    fn test_line_view_quantity_buttons() {
        let item = CartItem::new(
            ProductId::new(4),
            "Vase d'expansion 8L",
            Price::from_dinars(4_200),
            None,
        )
        .with_quantity(MAX_QUANTITY);
        let view = CartLineView::from(&item);

        assert!(view.at_max);
        assert_eq!(view.increment, MAX_QUANTITY);
        assert_eq!(view.decrement, MAX_QUANTITY - 1);
        assert_eq!(view.line_total, "42 000.00 DA");
    }

    #[test]
    fn test_cart_view_totals() {
        let mut cart = Cart::new();
        let sonde = CartItem::new(ProductId::new(1), "Sonde NTC", Price::from_dinars(1_500), None);
        cart.add(sonde.with_quantity(2));
        cart.add(CartItem::new(ProductId::new(2), "Pompe", Price::from_dinars(18_000), None));
        cart.open();

        let view = CartView::from(&cart);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.subtotal, "21 000.00 DA");
        assert!(view.is_open);
        assert_eq!(view.items.len(), 2);
    }

    #[test]
    fn test_panel_response_redirects_without_htmx() {
        let response = panel_response(&HeaderMap::new(), &Cart::new());
        assert!(response.status().is_redirection());
    }
}
