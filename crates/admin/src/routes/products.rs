//! Product management.
//!
//! Create and edit forms are multipart so gallery images travel with the
//! rest of the fields. Invalid submissions come back as the same form with
//! messages under each field.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use boilerparts_api::{Product, ProductFilter};
use boilerparts_core::{ProductId, ProductImageId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::forms::MultipartFields;
use crate::models::{CurrentAdmin, FieldErrors, Flash, ProductInput};
use crate::routes::{ChoiceView, Layout, flash_and_redirect, is_htmx, mutation_error};
use crate::state::AppState;

/// Backend page size for products.
const PAGE_SIZE: u32 = 12;

// =============================================================================
// Views
// =============================================================================

/// Product row for the listing.
#[derive(Debug, Clone)]
pub struct ProductRowView {
    pub id: ProductId,
    pub name: String,
    pub reference: String,
    pub image: Option<String>,
    pub price: String,
    pub stock: i32,
    pub is_active: bool,
    pub categories: String,
}

impl From<&Product> for ProductRowView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            reference: product.reference.clone().unwrap_or_default(),
            image: product.primary_image().map(str::to_string),
            price: product.price.display(),
            stock: product.stock,
            is_active: product.is_active,
            categories: product
                .categories
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// A gallery image already stored on the backend.
#[derive(Debug, Clone)]
pub struct ImageView {
    pub id: ProductImageId,
    pub url: String,
    /// Ticked for removal in the submitted form.
    pub remove: bool,
}

/// Everything the product form renders.
#[derive(Debug, Clone)]
pub struct ProductFormView {
    pub title: String,
    pub action: String,
    pub submit_label: &'static str,
    pub input: ProductInput,
    pub errors: FieldErrors,
    /// Backend failure shown above the fields.
    pub error: Option<String>,
    pub categories: Vec<ChoiceView>,
    pub tags: Vec<ChoiceView>,
    pub existing_images: Vec<ImageView>,
}

/// Which product a form is for.
enum Target<'a> {
    New,
    Existing(&'a Product),
}

impl ProductFormView {
    /// Build the form, loading category and tag choices.
    ///
    /// Choices that cannot be loaded are left empty; the product itself can
    /// still be saved.
    async fn build(
        state: &AppState,
        target: Target<'_>,
        input: ProductInput,
        errors: FieldErrors,
        error: Option<String>,
    ) -> Self {
        let (categories, tags) =
            tokio::join!(state.api().list_categories(), state.api().list_tags());

        let categories = categories
            .inspect_err(|e| warn!(error = %e, "Category choices unavailable"))
            .unwrap_or_default()
            .into_iter()
            .map(|c| ChoiceView {
                value: c.id.to_string(),
                selected: input.categories.contains(&c.id),
                label: c.name,
            })
            .collect();
        let tags = tags
            .inspect_err(|e| warn!(error = %e, "Tag choices unavailable"))
            .unwrap_or_default()
            .into_iter()
            .map(|t| ChoiceView {
                value: t.id.to_string(),
                selected: input.tags.contains(&t.id),
                label: t.name,
            })
            .collect();

        let (title, action, submit_label, existing_images) = match target {
            Target::New => (
                "New product".to_string(),
                "/products".to_string(),
                "Create product",
                Vec::new(),
            ),
            Target::Existing(product) => (
                format!("Edit {}", product.name),
                format!("/products/{}", product.id),
                "Save changes",
                product
                    .images
                    .iter()
                    .map(|img| ImageView {
                        id: img.id,
                        url: img.image.clone(),
                        remove: input.remove_images.contains(&img.id),
                    })
                    .collect(),
            ),
        };

        Self {
            title,
            action,
            submit_label,
            input,
            errors,
            error,
            categories,
            tags,
            existing_images,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Products list page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductRowView>,
    pub search: String,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
    pub error: Option<String>,
}

/// Product form inside the modal (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "products/modal.html")]
pub struct ProductModalTemplate {
    pub form: ProductFormView,
}

/// Product form as a full page.
#[derive(Template, WebTemplate)]
#[template(path = "products/form_page.html")]
pub struct ProductFormPage {
    pub layout: Layout,
    pub form: ProductFormView,
}

async fn render_form(
    session: &Session,
    admin: &CurrentAdmin,
    headers: &HeaderMap,
    form: ProductFormView,
) -> Result<Response> {
    if is_htmx(headers) {
        return Ok(ProductModalTemplate { form }.into_response());
    }
    Ok(ProductFormPage {
        layout: Layout::load(session, admin, "/products").await?,
        form,
    }
    .into_response())
}

// =============================================================================
// Queries
// =============================================================================

/// Product list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub page: String,
}

impl ProductsQuery {
    #[must_use]
    pub fn to_filter(&self) -> ProductFilter {
        ProductFilter {
            search: Some(self.q.trim().to_string()).filter(|q| !q.is_empty()),
            page: self.page.parse().ok().filter(|p| *p > 0),
            ..ProductFilter::default()
        }
    }
}

fn page_url(search: Option<&str>, page: u32) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    if let Some(search) = search {
        query.append_pair("q", search);
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

// =============================================================================
// Handlers
// =============================================================================

/// Products list page handler.
#[instrument(skip(state, session, auth))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    Query(query): Query<ProductsQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.to_filter();
    let page = filter.page.unwrap_or(1);
    let search = filter.search.as_deref();

    let (products, total, total_pages, has_next, error) =
        match state.api().list_products(&filter).await {
            Ok(listing) => (
                listing.results.iter().map(ProductRowView::from).collect(),
                listing.count,
                listing.total_pages(PAGE_SIZE),
                listing.has_next(),
                None,
            ),
            Err(e) => {
                tracing::error!("Failed to fetch products: {e}");
                (
                    Vec::new(),
                    0,
                    1,
                    false,
                    Some("Products could not be loaded from the backend.".to_string()),
                )
            }
        };

    Ok(ProductsIndexTemplate {
        layout: Layout::load(&session, &auth.admin, "/products").await?,
        products,
        search: search.unwrap_or_default().to_string(),
        total,
        page,
        total_pages,
        prev_url: (page > 1).then(|| page_url(search, page - 1)),
        next_url: has_next.then(|| page_url(search, page + 1)),
        error,
    })
}

/// Blank product form.
#[instrument(skip(state, session, auth, headers))]
pub async fn new_form(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    headers: HeaderMap,
) -> Result<Response> {
    let form = ProductFormView::build(
        &state,
        Target::New,
        ProductInput::new_product(),
        FieldErrors::new(),
        None,
    )
    .await;
    render_form(&session, &auth.admin, &headers, form).await
}

/// Create a product.
#[instrument(skip_all, fields(admin = %auth.admin.username))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response> {
    let input = ProductInput::from_fields(MultipartFields::read(multipart).await?);

    let body = match input.validate() {
        Ok(body) => body,
        Err(errors) => {
            let form = ProductFormView::build(&state, Target::New, input, errors, None).await;
            return render_form(&session, &auth.admin, &headers, form).await;
        }
    };

    match state.api().create_product(auth.tokens.access(), body).await {
        Ok(product) => {
            info!(product_id = %product.id, "Product created");
            let flash = Flash::success(format!("Product \"{}\" created.", product.name));
            flash_and_redirect(&session, &headers, flash, "/products").await
        }
        Err(e) => {
            let message = mutation_error(e, "product")?;
            let form = ProductFormView::build(
                &state,
                Target::New,
                input,
                FieldErrors::new(),
                Some(message),
            )
            .await;
            render_form(&session, &auth.admin, &headers, form).await
        }
    }
}

/// Product edit form.
#[instrument(skip(state, session, auth, headers))]
pub async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let product = state.api().get_product(id).await?;
    let form = ProductFormView::build(
        &state,
        Target::Existing(&product),
        ProductInput::from_product(&product),
        FieldErrors::new(),
        None,
    )
    .await;
    render_form(&session, &auth.admin, &headers, form).await
}

/// Update a product.
#[instrument(skip_all, fields(admin = %auth.admin.username, product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response> {
    let input = ProductInput::from_fields(MultipartFields::read(multipart).await?);

    let (errors, error) = match input.validate() {
        Ok(body) => match state.api().update_product(auth.tokens.access(), id, body).await {
            Ok(product) => {
                info!("Product updated");
                let flash = Flash::success(format!("Product \"{}\" saved.", product.name));
                return flash_and_redirect(&session, &headers, flash, "/products").await;
            }
            Err(e) => (FieldErrors::new(), Some(mutation_error(e, "product")?)),
        },
        Err(errors) => (errors, None),
    };

    // The gallery is not part of the submission; fetch it again to re-render.
    let product = state.api().get_product(id).await?;
    let form =
        ProductFormView::build(&state, Target::Existing(&product), input, errors, error).await;
    render_form(&session, &auth.admin, &headers, form).await
}

/// Delete a product.
#[instrument(skip(state, session, auth, headers))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let flash = match state.api().delete_product(auth.tokens.access(), id).await {
        Ok(()) => {
            info!(product_id = %id, "Product deleted");
            Flash::success("Product deleted.")
        }
        Err(e) => Flash::error(mutation_error(e, "product")?),
    };

    flash_and_redirect(&session, &headers, flash, "/products").await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use boilerparts_api::{Category, ProductImage};
    use boilerparts_core::{CategoryId, Price};

    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new(3),
            name: "Vase d'expansion 8L".to_string(),
            reference: Some("VE-8".to_string()),
            description: String::new(),
            price: Price::from_dinars(4_200),
            old_price: None,
            stock: 0,
            brand: None,
            image: None,
            images: vec![ProductImage {
                id: ProductImageId::new(30),
                image: "https://cdn.example.test/ve8.jpg".to_string(),
            }],
            categories: vec![
                Category {
                    id: CategoryId::new(1),
                    name: "Hydraulique".to_string(),
                    slug: None,
                    description: None,
                    image: None,
                },
                Category {
                    id: CategoryId::new(2),
                    name: "Sécurité".to_string(),
                    slug: None,
                    description: None,
                    image: None,
                },
            ],
            tags: Vec::new(),
            is_active: false,
            created_at: None,
        }
    }

    #[test]
    fn test_row_view() {
        let row = ProductRowView::from(&product());
        assert_eq!(row.reference, "VE-8");
        assert_eq!(row.price, "4 200.00 DA");
        assert_eq!(row.categories, "Hydraulique, Sécurité");
        assert_eq!(row.image.as_deref(), Some("https://cdn.example.test/ve8.jpg"));
        assert!(!row.is_active);
    }

    #[test]
    fn test_query_and_page_urls() {
        let query = ProductsQuery {
            q: " thermostat ".to_string(),
            page: "3".to_string(),
        };
        let filter = query.to_filter();
        assert_eq!(filter.search.as_deref(), Some("thermostat"));
        assert_eq!(filter.page, Some(3));

        assert_eq!(page_url(Some("vanne 3 voies"), 2), "/products?q=vanne+3+voies&page=2");
        assert_eq!(page_url(None, 1), "/products");
    }
}
