//! Catalog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use boilerparts_api::{Category, Page, Product, ProductFilter, ProductSort, Tag};
use boilerparts_core::{CategoryId, MAX_QUANTITY, Price, ProductId, TagId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};

use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::routes::LayoutView;
use crate::services::cart as cart_service;
use crate::state::AppState;

/// Products per catalog page, matching the backend's pagination.
pub const PAGE_SIZE: u32 = 12;

/// Maximum number of related products shown on a detail page.
const RELATED_LIMIT: usize = 4;

// =============================================================================
// Views
// =============================================================================

/// Product card data for grids.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: ProductId,
    pub name: String,
    pub brand: Option<String>,
    pub price: String,
    pub old_price: Option<String>,
    pub image: Option<String>,
    pub in_stock: bool,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            brand: product.brand.clone(),
            price: product.price.display(),
            old_price: product
                .is_on_sale()
                .then(|| product.old_price.map(|p| p.display()))
                .flatten(),
            image: product.primary_image().map(str::to_string),
            in_stock: product.in_stock(),
        }
    }
}

/// Full product data for the detail page.
#[derive(Clone)]
pub struct ProductDetailView {
    pub card: ProductCardView,
    pub reference: Option<String>,
    pub description: String,
    pub stock: i32,
    pub images: Vec<String>,
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
    /// Upper bound for the quantity picker.
    pub max_quantity: u32,
}

impl From<&Product> for ProductDetailView {
    fn from(product: &Product) -> Self {
        let mut images: Vec<String> = product.image.iter().cloned().collect();
        images.extend(product.images.iter().map(|img| img.image.clone()));
        images.dedup();

        let stock = u32::try_from(product.stock).unwrap_or(0);

        Self {
            card: ProductCardView::from(product),
            reference: product.reference.clone(),
            description: product.description.clone(),
            stock: product.stock,
            images,
            categories: product.categories.clone(),
            tags: product.tags.clone(),
            max_quantity: stock.clamp(1, MAX_QUANTITY),
        }
    }
}

/// A selectable category or tag in the catalog sidebar.
#[derive(Clone)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl FilterOption {
    fn new(value: impl ToString, label: &str, selected: bool) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            selected,
        }
    }
}

/// A sort option in the catalog toolbar.
#[derive(Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Pagination state for the catalog.
#[derive(Clone)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

// =============================================================================
// Query Parsing
// =============================================================================

/// Catalog query string.
///
/// Every field is read as text so that an empty or malformed value is
/// ignored instead of rejecting the whole request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

fn parse_opt<T: std::str::FromStr>(value: Option<&String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

impl CatalogQuery {
    /// Convert to a backend filter.
    #[must_use]
    pub fn to_filter(&self) -> ProductFilter {
        ProductFilter {
            search: self
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            category: parse_opt::<CategoryId>(self.category.as_ref()),
            tag: parse_opt::<TagId>(self.tag.as_ref()),
            min_price: parse_opt::<u32>(self.min_price.as_ref())
                .map(|p| Price::from_dinars(i64::from(p))),
            max_price: parse_opt::<u32>(self.max_price.as_ref())
                .map(|p| Price::from_dinars(i64::from(p))),
            sort: parse_opt::<ProductSort>(self.sort.as_ref()).unwrap_or_default(),
            page: parse_opt::<u32>(self.page.as_ref()).filter(|p| *p >= 1),
        }
    }
}

/// Rebuild the catalog URL for a filter with a different page.
fn page_url(filter: &ProductFilter, page: u32) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    if let Some(search) = &filter.search {
        query.append_pair("q", search);
    }
    if let Some(category) = filter.category {
        query.append_pair("category", &category.to_string());
    }
    if let Some(tag) = filter.tag {
        query.append_pair("tag", &tag.to_string());
    }
    if let Some(min) = filter.min_price {
        query.append_pair("min_price", &min.amount().trunc().to_string());
    }
    if let Some(max) = filter.max_price {
        query.append_pair("max_price", &max.amount().trunc().to_string());
    }
    if filter.sort != ProductSort::default() {
        query.append_pair("sort", filter.sort.as_str());
    }
    if page > 1 {
        query.append_pair("page", &page.to_string());
    }

    let query = query.finish();
    if query.is_empty() {
        "/products".to_string()
    } else {
        format!("/products?{query}")
    }
}

fn pagination(filter: &ProductFilter, page: &Page<Product>) -> Pagination {
    let current_page = filter.page.unwrap_or(1);
    Pagination {
        current_page,
        total_pages: page.total_pages(PAGE_SIZE).max(1),
        prev_url: (current_page > 1).then(|| page_url(filter, current_page - 1)),
        next_url: page
            .has_next()
            .then(|| page_url(filter, current_page + 1)),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: LayoutView,
    pub products: Vec<ProductCardView>,
    pub total_count: u64,
    pub categories: Vec<FilterOption>,
    pub tags: Vec<FilterOption>,
    pub sort_options: Vec<SortOption>,
    pub search: String,
    pub min_price: String,
    pub max_price: String,
    pub pagination: Pagination,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: LayoutView,
    pub product: ProductDetailView,
    pub related_products: Vec<ProductCardView>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the catalog.
#[instrument(skip(state, session, customer))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Query(query): Query<CatalogQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.to_filter();
    let api = state.api();

    let (page, categories, tags) = tokio::join!(
        api.list_products(&filter),
        api.list_categories(),
        api.list_tags(),
    );
    let page = page?;

    // Filter sidebars are optional; the grid is not
    let categories = categories.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load categories");
        Vec::new()
    });
    let tags = tags.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load tags");
        Vec::new()
    });

    let cart = cart_service::load(&session).await?;

    Ok(ProductsIndexTemplate {
        layout: LayoutView::new(&state, customer.as_ref(), &cart),
        products: page.results.iter().map(ProductCardView::from).collect(),
        total_count: page.count,
        categories: categories
            .iter()
            .map(|c| FilterOption::new(c.id, &c.name, filter.category == Some(c.id)))
            .collect(),
        tags: tags
            .iter()
            .map(|t| FilterOption::new(t.id, &t.name, filter.tag == Some(t.id)))
            .collect(),
        sort_options: ProductSort::ALL
            .into_iter()
            .map(|sort| SortOption {
                value: sort.as_str(),
                label: sort.label(),
                selected: sort == filter.sort,
            })
            .collect(),
        search: filter.search.clone().unwrap_or_default(),
        min_price: query.min_price.clone().unwrap_or_default(),
        max_price: query.max_price.clone().unwrap_or_default(),
        pagination: pagination(&filter, &page),
    })
}

/// Display a product.
#[instrument(skip(state, session, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let product = state.api().get_product(id).await?;

    let related_products = match product.categories.first() {
        Some(category) => {
            let filter = ProductFilter {
                category: Some(category.id),
                ..ProductFilter::default()
            };
            match state.api().list_products(&filter).await {
                Ok(page) => page
                    .results
                    .iter()
                    .filter(|p| p.id != product.id)
                    .take(RELATED_LIMIT)
                    .map(ProductCardView::from)
                    .collect(),
                Err(e) => {
                    warn!(error = %e, "Failed to load related products");
                    Vec::new()
                }
            }
        }
        None => Vec::new(),
    };

    let cart = cart_service::load(&session).await?;

    Ok(ProductShowTemplate {
        layout: LayoutView::new(&state, customer.as_ref(), &cart),
        product: ProductDetailView::from(&product),
        related_products,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> CatalogQuery {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        let uri: axum::http::Uri = format!("/products?{encoded}").parse().unwrap();
        let Query(query) = Query::<CatalogQuery>::try_from_uri(&uri).unwrap();
        query
    }

    #[test]
    fn test_blank_and_malformed_values_are_ignored() {
        let filter = query(&[
            ("q", "  "),
            ("category", ""),
            ("tag", "abc"),
            ("min_price", "-5"),
            ("sort", "cheapest"),
            ("page", "0"),
        ])
        .to_filter();

        assert_eq!(filter, ProductFilter::default());
    }

    #[test]
    fn test_full_query_maps_to_filter() {
        let filter = query(&[
            ("q", "vanne"),
            ("category", "3"),
            ("tag", "7"),
            ("min_price", "1000"),
            ("max_price", "5000"),
            ("sort", "price_asc"),
            ("page", "2"),
        ])
        .to_filter();

        assert_eq!(filter.search.as_deref(), Some("vanne"));
        assert_eq!(filter.category, Some(CategoryId::new(3)));
        assert_eq!(filter.tag, Some(TagId::new(7)));
        assert_eq!(filter.min_price, Some(Price::from_dinars(1000)));
        assert_eq!(filter.max_price, Some(Price::from_dinars(5000)));
        assert_eq!(filter.sort, ProductSort::PriceAsc);
        assert_eq!(filter.page, Some(2));
    }

    #[test]
    fn test_page_url_keeps_filters() {
        let filter = ProductFilter {
            search: Some("pompe grundfos".to_string()),
            category: Some(CategoryId::new(2)),
            sort: ProductSort::PriceDesc,
            ..ProductFilter::default()
        };

        assert_eq!(
            page_url(&filter, 3),
            "/products?q=pompe+grundfos&category=2&sort=price_desc&page=3"
        );
        assert_eq!(
            page_url(&filter, 1),
            "/products?q=pompe+grundfos&category=2&sort=price_desc"
        );
        assert_eq!(page_url(&ProductFilter::default(), 1), "/products");
    }

    #[test]
    fn test_detail_page_renders_cart_badge() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": 7,
            "name": "Thermocouple universel",
            "price": "1500.00",
            "stock": 3
        }))
        .unwrap();
        let mut page = ProductShowTemplate {
            layout: LayoutView {
                store_name: "Boiler Parts".to_string(),
                store_phone: None,
                customer_name: None,
                cart_count: 0,
            },
            product: ProductDetailView::from(&product),
            related_products: Vec::new(),
        };

        let html = page.render().unwrap();
        assert!(html.contains(r#"class="cart-count is-empty">0<"#));
        assert!(html.contains("In stock (3)"));

        page.layout.cart_count = 4;
        assert!(page.render().unwrap().contains(r#"class="cart-count">4<"#));
    }
}
