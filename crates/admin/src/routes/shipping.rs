//! Delivery prices per wilaya.
//!
//! One row per wilaya with its own form. With HTMX a row is saved in place
//! and re-rendered; without it the page reloads with a flash message.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use boilerparts_api::Wilaya;
use boilerparts_core::WilayaId;
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{FieldErrors, Flash, ShippingInput};
use crate::routes::{Layout, flash_and_redirect, is_htmx, mutation_error};
use crate::state::AppState;

/// Editable row for one wilaya.
#[derive(Debug, Clone)]
pub struct WilayaRowView {
    pub id: WilayaId,
    pub label: String,
    pub home_delivery_price: String,
    pub desk_delivery_price: String,
    pub is_active: bool,
    pub errors: FieldErrors,
    pub error: Option<String>,
    pub saved: bool,
}

impl From<&Wilaya> for WilayaRowView {
    fn from(wilaya: &Wilaya) -> Self {
        Self {
            id: wilaya.id,
            label: wilaya.label(),
            home_delivery_price: wilaya.home_delivery_price.amount().to_string(),
            desk_delivery_price: wilaya.desk_delivery_price.amount().to_string(),
            is_active: wilaya.is_active,
            errors: FieldErrors::new(),
            error: None,
            saved: false,
        }
    }
}

impl WilayaRowView {
    /// Row showing what the operator typed, with messages.
    fn rejected(
        wilaya: &Wilaya,
        input: &ShippingInput,
        errors: FieldErrors,
        error: Option<String>,
    ) -> Self {
        Self {
            home_delivery_price: input.home_delivery_price.clone(),
            desk_delivery_price: input.desk_delivery_price.clone(),
            is_active: input.is_active.is_some(),
            errors,
            error,
            ..Self::from(wilaya)
        }
    }
}

/// Shipping page template.
#[derive(Template, WebTemplate)]
#[template(path = "shipping/index.html")]
pub struct ShippingIndexTemplate {
    pub layout: Layout,
    pub rows: Vec<WilayaRowView>,
}

/// A single table row (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "shipping/row.html")]
pub struct ShippingRowTemplate {
    pub row: WilayaRowView,
}

/// Shipping prices page handler.
#[instrument(skip(state, session, auth))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
) -> Result<impl IntoResponse> {
    let mut wilayas = state.api().list_wilayas().await?;
    wilayas.sort_by_key(|w| w.code);

    Ok(ShippingIndexTemplate {
        layout: Layout::load(&session, &auth.admin, "/shipping").await?,
        rows: wilayas.iter().map(WilayaRowView::from).collect(),
    })
}

/// Update one wilaya's delivery prices.
#[instrument(skip(state, session, auth, headers, input))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    headers: HeaderMap,
    Path(id): Path<WilayaId>,
    Form(input): Form<ShippingInput>,
) -> Result<Response> {
    let wilaya = state
        .api()
        .find_wilaya(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("wilaya {id}")))?;
    let htmx = is_htmx(&headers);

    let prices = match input.validate() {
        Ok(prices) => prices,
        Err(errors) if htmx => {
            return Ok(ShippingRowTemplate {
                row: WilayaRowView::rejected(&wilaya, &input, errors, None),
            }
            .into_response());
        }
        Err(_) => {
            let flash = Flash::error(format!(
                "{}: enter both prices as amounts in DA.",
                wilaya.label()
            ));
            return flash_and_redirect(&session, &headers, flash, "/shipping").await;
        }
    };

    match state
        .api()
        .update_wilaya_prices(auth.tokens.access(), id, &prices)
        .await
    {
        Ok(updated) => {
            info!(wilaya = %updated.label(), "Delivery prices saved");
            if htmx {
                let mut row = WilayaRowView::from(&updated);
                row.saved = true;
                return Ok(ShippingRowTemplate { row }.into_response());
            }
            let flash = Flash::success(format!("{}: delivery prices saved.", updated.label()));
            flash_and_redirect(&session, &headers, flash, "/shipping").await
        }
        Err(e) => {
            let message = mutation_error(e, "delivery prices")?;
            if htmx {
                let row =
                    WilayaRowView::rejected(&wilaya, &input, FieldErrors::new(), Some(message));
                return Ok(ShippingRowTemplate { row }.into_response());
            }
            flash_and_redirect(&session, &headers, Flash::error(message), "/shipping").await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use boilerparts_core::Price;

    use super::*;

    #[test]
    fn test_row_from_wilaya() {
        let wilaya = Wilaya {
            id: WilayaId::new(16),
            code: 16,
            name: "Alger".to_string(),
            home_delivery_price: Price::from_dinars(600),
            desk_delivery_price: Price::from_dinars(400),
            is_active: true,
        };
        let row = WilayaRowView::from(&wilaya);
        assert_eq!(row.label, "16 - Alger");
        assert_eq!(row.home_delivery_price, "600");
        assert!(row.is_active);

        let input = ShippingInput {
            home_delivery_price: "six cents".to_string(),
            desk_delivery_price: "400".to_string(),
            is_active: None,
        };
        let rejected =
            WilayaRowView::rejected(&wilaya, &input, input.validate().unwrap_err(), None);
        assert_eq!(rejected.home_delivery_price, "six cents");
        assert!(!rejected.is_active);
        assert!(rejected.errors.has("home_delivery_price"));
    }
}
