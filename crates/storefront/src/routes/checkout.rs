//! Checkout wizard route handlers.
//!
//! Three steps (contact, delivery, review) stored as a [`CheckoutDraft`] in
//! the session. Confirming posts the order to the backend; the cart is only
//! cleared once the backend has accepted it.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use boilerparts_api::{TokenStore, Wilaya};
use boilerparts_core::{Cart, DeliveryType, WilayaId};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{error, info, instrument, warn};

use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{
    CheckoutDraft, CheckoutStep, ContactForm, CurrentCustomer, DeliveryForm, FieldErrors,
    session_keys,
};
use crate::routes::LayoutView;
use crate::routes::cart::CartLineView;
use crate::services::{cart as cart_service, checkout as checkout_service};
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// A wilaya in the delivery dropdown.
#[derive(Clone)]
pub struct WilayaOption {
    pub id: WilayaId,
    pub label: String,
    pub home_price: String,
    pub desk_price: String,
    pub selected: bool,
}

/// Order summary shown next to every step.
#[derive(Clone)]
pub struct SummaryView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub shipping: Option<String>,
    pub total: String,
}

impl SummaryView {
    fn new(cart: &Cart, draft: &CheckoutDraft) -> Self {
        Self {
            lines: cart.items().iter().map(CartLineView::from).collect(),
            subtotal: cart.total_price().display(),
            shipping: draft.shipping_price().map(|p| p.display()),
            total: draft.grand_total(cart).display(),
        }
    }
}

/// Contact and delivery details as shown on the review step.
#[derive(Clone)]
pub struct ReviewDetails {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub wilaya: String,
    pub commune: String,
    pub address: Option<String>,
    pub delivery: &'static str,
    pub note: Option<String>,
}

impl ReviewDetails {
    fn from_draft(draft: &CheckoutDraft) -> Option<Self> {
        let (contact, delivery) = (draft.contact.as_ref()?, draft.delivery.as_ref()?);
        Some(Self {
            full_name: contact.full_name.clone(),
            phone: contact.phone.to_string(),
            email: contact.email.as_ref().map(ToString::to_string),
            wilaya: delivery.wilaya_name.clone(),
            commune: delivery.commune.clone(),
            address: delivery.address.clone(),
            delivery: delivery.delivery_type.label(),
            note: delivery.note.clone(),
        })
    }
}

/// The last order placed in this session, shown on the success page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub number: String,
    pub full_name: String,
    pub phone: String,
    pub total: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Step 1 template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/contact.html")]
pub struct ContactTemplate {
    pub layout: LayoutView,
    pub step: u8,
    pub form: ContactForm,
    pub errors: FieldErrors,
    pub summary: SummaryView,
}

/// Step 2 template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/delivery.html")]
pub struct DeliveryTemplate {
    pub layout: LayoutView,
    pub step: u8,
    pub form: DeliveryForm,
    pub wilayas: Vec<WilayaOption>,
    pub errors: FieldErrors,
    pub summary: SummaryView,
}

/// Step 3 template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/review.html")]
pub struct ReviewTemplate {
    pub layout: LayoutView,
    pub step: u8,
    pub details: ReviewDetails,
    pub summary: SummaryView,
    pub error: Option<String>,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct SuccessTemplate {
    pub layout: LayoutView,
    pub order: PlacedOrder,
}

/// Shipping price fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/shipping_quote.html")]
pub struct ShippingQuoteTemplate {
    pub shipping: Option<String>,
    pub total: String,
}

// =============================================================================
// Helpers
// =============================================================================

/// Session state every step needs.
struct WizardState {
    cart: Cart,
    draft: CheckoutDraft,
}

impl WizardState {
    async fn load(session: &Session) -> Result<Self> {
        Ok(Self {
            cart: cart_service::load(session).await?,
            draft: checkout_service::load(session).await?,
        })
    }

    /// Where to send a visitor who may not see `step` yet.
    fn redirect_for(&self, step: CheckoutStep) -> Option<Redirect> {
        if self.cart.is_empty() {
            return Some(Redirect::to("/cart"));
        }
        (!self.draft.can_access(step)).then(|| Redirect::to(self.draft.current_step().path()))
    }
}

fn wilaya_options(wilayas: &[Wilaya], selected: &str) -> Vec<WilayaOption> {
    wilayas
        .iter()
        .filter(|w| w.is_active)
        .map(|w| WilayaOption {
            id: w.id,
            label: w.label(),
            home_price: w.home_delivery_price.display(),
            desk_price: w.desk_delivery_price.display(),
            selected: w.id.to_string() == selected,
        })
        .collect()
}

/// Prefill step 1 from the logged-in customer's profile.
fn contact_prefill(customer: Option<&CurrentCustomer>) -> ContactForm {
    customer.map_or_else(ContactForm::default, |c| ContactForm {
        full_name: c.display_name.clone(),
        phone: c.phone.clone().unwrap_or_default(),
        email: c.email.clone().unwrap_or_default(),
    })
}

// =============================================================================
// Step 1: contact
// =============================================================================

/// Display the contact step.
#[instrument(skip(state, session, customer))]
pub async fn contact_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Result<Response> {
    let wizard = WizardState::load(&session).await?;
    if let Some(redirect) = wizard.redirect_for(CheckoutStep::Contact) {
        return Ok(redirect.into_response());
    }

    let form = wizard.draft.contact.as_ref().map_or_else(
        || contact_prefill(customer.as_ref()),
        ContactForm::from,
    );

    Ok(ContactTemplate {
        layout: LayoutView::new(&state, customer.as_ref(), &wizard.cart),
        step: CheckoutStep::Contact.number(),
        form,
        errors: FieldErrors::new(),
        summary: SummaryView::new(&wizard.cart, &wizard.draft),
    }
    .into_response())
}

/// Save the contact step.
#[instrument(skip(state, session, customer, form))]
pub async fn submit_contact(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Form(form): Form<ContactForm>,
) -> Result<Response> {
    let mut wizard = WizardState::load(&session).await?;
    if let Some(redirect) = wizard.redirect_for(CheckoutStep::Contact) {
        return Ok(redirect.into_response());
    }

    match form.validate() {
        Ok(contact) => {
            wizard.draft.contact = Some(contact);
            checkout_service::save(&session, &wizard.draft).await?;
            Ok(Redirect::to(CheckoutStep::Delivery.path()).into_response())
        }
        Err(errors) => Ok(ContactTemplate {
            layout: LayoutView::new(&state, customer.as_ref(), &wizard.cart),
            step: CheckoutStep::Contact.number(),
            form,
            errors,
            summary: SummaryView::new(&wizard.cart, &wizard.draft),
        }
        .into_response()),
    }
}

// =============================================================================
// Step 2: delivery
// =============================================================================

/// Display the delivery step.
#[instrument(skip(state, session, customer))]
pub async fn delivery_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Result<Response> {
    let wizard = WizardState::load(&session).await?;
    if let Some(redirect) = wizard.redirect_for(CheckoutStep::Delivery) {
        return Ok(redirect.into_response());
    }

    let wilayas = state.api().list_wilayas().await?;
    let form = wizard.draft.delivery.as_ref().map_or_else(
        || DeliveryForm {
            delivery_type: DeliveryType::Home.as_str().to_string(),
            ..DeliveryForm::default()
        },
        DeliveryForm::from,
    );

    Ok(DeliveryTemplate {
        layout: LayoutView::new(&state, customer.as_ref(), &wizard.cart),
        step: CheckoutStep::Delivery.number(),
        wilayas: wilaya_options(&wilayas, &form.wilaya),
        form,
        errors: FieldErrors::new(),
        summary: SummaryView::new(&wizard.cart, &wizard.draft),
    }
    .into_response())
}

/// Save the delivery step.
///
/// The shipping price is looked up from the wilaya table here, never taken
/// from the form.
#[instrument(skip(state, session, customer, form))]
pub async fn submit_delivery(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Form(form): Form<DeliveryForm>,
) -> Result<Response> {
    let mut wizard = WizardState::load(&session).await?;
    if let Some(redirect) = wizard.redirect_for(CheckoutStep::Delivery) {
        return Ok(redirect.into_response());
    }

    let wilayas = state.api().list_wilayas().await?;

    match form.validate(&wilayas) {
        Ok(delivery) => {
            wizard.draft.delivery = Some(delivery);
            checkout_service::save(&session, &wizard.draft).await?;
            Ok(Redirect::to(CheckoutStep::Review.path()).into_response())
        }
        Err(errors) => Ok(DeliveryTemplate {
            layout: LayoutView::new(&state, customer.as_ref(), &wizard.cart),
            step: CheckoutStep::Delivery.number(),
            wilayas: wilaya_options(&wilayas, &form.wilaya),
            form,
            errors,
            summary: SummaryView::new(&wizard.cart, &wizard.draft),
        }
        .into_response()),
    }
}

/// Query for the shipping quote fragment.
#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    #[serde(default)]
    pub wilaya: String,
    #[serde(default)]
    pub delivery_type: String,
}

/// Shipping price and grand total for a wilaya and delivery type (HTMX).
#[instrument(skip(state, session))]
pub async fn shipping_quote(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<QuoteQuery>,
) -> Result<impl IntoResponse> {
    let cart = cart_service::load(&session).await?;
    let subtotal = cart.total_price();

    let wilaya_id = query.wilaya.parse::<WilayaId>().ok();
    let delivery_type = query.delivery_type.parse::<DeliveryType>().ok();

    let shipping = match (wilaya_id, delivery_type) {
        (Some(id), Some(delivery_type)) => match state.api().find_wilaya(id).await {
            Ok(wilaya) => wilaya
                .filter(|w| w.is_active)
                .map(|w| w.shipping_price(delivery_type)),
            Err(e) => {
                warn!(error = %e, "Failed to look up wilaya for shipping quote");
                None
            }
        },
        _ => None,
    };

    Ok(ShippingQuoteTemplate {
        shipping: shipping.map(|p| p.display()),
        total: shipping.map_or(subtotal, |p| subtotal + p).display(),
    })
}

// =============================================================================
// Step 3: review and confirm
// =============================================================================

fn review_template(
    state: &AppState,
    customer: Option<&CurrentCustomer>,
    wizard: &WizardState,
    details: ReviewDetails,
    error: Option<String>,
) -> ReviewTemplate {
    ReviewTemplate {
        layout: LayoutView::new(state, customer, &wizard.cart),
        step: CheckoutStep::Review.number(),
        details,
        summary: SummaryView::new(&wizard.cart, &wizard.draft),
        error,
    }
}

/// Display the review step.
#[instrument(skip(state, session, customer))]
pub async fn review_page(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Result<Response> {
    let wizard = WizardState::load(&session).await?;
    if let Some(redirect) = wizard.redirect_for(CheckoutStep::Review) {
        return Ok(redirect.into_response());
    }
    let Some(details) = ReviewDetails::from_draft(&wizard.draft) else {
        return Ok(Redirect::to(wizard.draft.current_step().path()).into_response());
    };

    Ok(review_template(&state, customer.as_ref(), &wizard, details, None).into_response())
}

/// Submit the order.
///
/// On success the cart and draft are cleared and the visitor lands on the
/// confirmation page. On failure both are kept and the review step shows
/// the error.
#[instrument(skip(state, session, customer))]
pub async fn confirm(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Result<Response> {
    let wizard = WizardState::load(&session).await?;
    if let Some(redirect) = wizard.redirect_for(CheckoutStep::Review) {
        return Ok(redirect.into_response());
    }
    let (Some(order), Some(details)) = (
        wizard.draft.to_new_order(&wizard.cart),
        ReviewDetails::from_draft(&wizard.draft),
    ) else {
        return Ok(Redirect::to(wizard.draft.current_step().path()).into_response());
    };

    // Logged-in customers get the order linked to their account
    let tokens = if customer.is_some() {
        TokenStore::load(&session).await?
    } else {
        None
    };

    let placed = match state
        .api()
        .create_order(tokens.as_ref().map(|t| t.access()), &order)
        .await
    {
        Ok(placed) => placed,
        Err(e) => {
            let message = if e.is_validation() {
                warn!(error = %e, "Backend rejected order");
                "Some items in your order are no longer available. Please review your cart."
            } else {
                error!(error = %e, "Failed to submit order");
                "We could not place your order right now. Your cart has been kept, please try again."
            };
            return Ok(review_template(
                &state,
                customer.as_ref(),
                &wizard,
                details,
                Some(message.to_string()),
            )
            .into_response());
        }
    };

    cart_service::update(&session, |cart| {
        cart.clear();
        cart.close();
    })
    .await?;
    checkout_service::clear(&session).await?;

    let summary = PlacedOrder {
        number: placed.id.to_string(),
        full_name: placed.full_name.clone(),
        phone: placed.phone.clone(),
        total: placed.total_price.display(),
    };
    session.insert(session_keys::LAST_ORDER, &summary).await?;

    info!(order_id = %placed.id, total = %placed.total_price, "Order placed");
    add_breadcrumb("checkout", "Order placed", &[("order_id", placed.id.to_string())]);

    Ok(Redirect::to("/checkout/success").into_response())
}

/// Display the order confirmation.
#[instrument(skip(state, session, customer))]
pub async fn success(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Result<Response> {
    let Some(order) = session.get::<PlacedOrder>(session_keys::LAST_ORDER).await? else {
        return Ok(Redirect::to("/").into_response());
    };
    let cart = cart_service::load(&session).await?;

    Ok(SuccessTemplate {
        layout: LayoutView::new(&state, customer.as_ref(), &cart),
        order,
    }
    .into_response())
}
