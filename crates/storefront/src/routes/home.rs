//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use boilerparts_api::{Category, ProductFilter, ProductSort};
use tower_sessions::Session;
use tracing::{instrument, warn};

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::LayoutView;
use crate::routes::products::ProductCardView;
use crate::services::cart as cart_service;
use crate::state::AppState;

/// Number of products in the "latest arrivals" grid.
const LATEST_LIMIT: usize = 8;

/// A selling point shown under the hero.
#[derive(Clone)]
pub struct Highlight {
    pub title: &'static str,
    pub text: &'static str,
}

/// Static marketing content for the home page.
const HIGHLIGHTS: [Highlight; 3] = [
    Highlight {
        title: "Delivery to all 58 wilayas",
        text: "Home delivery or desk pick-up anywhere in Algeria.",
    },
    Highlight {
        title: "Cash on delivery",
        text: "You only pay when your order arrives.",
    },
    Highlight {
        title: "Genuine parts",
        text: "Control boards, pumps, valves and sensors for every major brand.",
    },
];

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: LayoutView,
    pub highlights: Vec<Highlight>,
    pub categories: Vec<Category>,
    pub latest_products: Vec<ProductCardView>,
}

/// Display the home page.
///
/// Backend failures degrade to empty sections so the home page always renders.
#[instrument(skip(state, session, customer))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> Result<impl IntoResponse> {
    let api = state.api();
    let filter = ProductFilter {
        sort: ProductSort::Newest,
        ..ProductFilter::default()
    };

    let (categories, latest) = tokio::join!(api.list_categories(), api.list_products(&filter));

    let categories = categories.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load categories for home page");
        Vec::new()
    });
    let latest_products = latest.map_or_else(
        |e| {
            warn!(error = %e, "Failed to load latest products for home page");
            Vec::new()
        },
        |page| {
            page.results
                .iter()
                .filter(|p| p.is_active)
                .take(LATEST_LIMIT)
                .map(ProductCardView::from)
                .collect()
        },
    );

    let cart = cart_service::load(&session).await?;

    Ok(HomeTemplate {
        layout: LayoutView::new(&state, customer.as_ref(), &cart),
        highlights: HIGHLIGHTS.to_vec(),
        categories,
        latest_products,
    })
}
