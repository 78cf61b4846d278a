//! Category management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use boilerparts_api::Category;
use boilerparts_core::CategoryId;
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::forms::MultipartFields;
use crate::models::{CategoryInput, CurrentAdmin, FieldErrors, Flash};
use crate::routes::{Layout, flash_and_redirect, is_htmx, mutation_error};
use crate::state::AppState;

/// Category create/edit form.
#[derive(Debug, Clone)]
pub struct CategoryFormView {
    pub title: String,
    pub action: String,
    pub submit_label: &'static str,
    pub name: String,
    pub description: String,
    /// Image currently stored on the backend.
    pub current_image: Option<String>,
    pub errors: FieldErrors,
    pub error: Option<String>,
}

impl CategoryFormView {
    fn new_category(input: &CategoryInput, errors: FieldErrors, error: Option<String>) -> Self {
        Self {
            title: "New category".to_string(),
            action: "/categories".to_string(),
            submit_label: "Create category",
            name: input.name.clone(),
            description: input.description.clone(),
            current_image: None,
            errors,
            error,
        }
    }

    fn existing(category: &Category) -> Self {
        Self {
            title: format!("Edit {}", category.name),
            action: format!("/categories/{}", category.id),
            submit_label: "Save changes",
            name: category.name.clone(),
            description: category.description.clone().unwrap_or_default(),
            current_image: category.image.clone(),
            errors: FieldErrors::new(),
            error: None,
        }
    }

    /// The submitted values over an existing category.
    fn resubmitted(
        category: &Category,
        input: &CategoryInput,
        errors: FieldErrors,
        error: Option<String>,
    ) -> Self {
        Self {
            name: input.name.clone(),
            description: input.description.clone(),
            errors,
            error,
            ..Self::existing(category)
        }
    }
}

/// Categories list page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub layout: Layout,
    pub categories: Vec<Category>,
}

/// Category form inside the modal (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "categories/modal.html")]
pub struct CategoryModalTemplate {
    pub form: CategoryFormView,
}

/// Category form as a full page.
#[derive(Template, WebTemplate)]
#[template(path = "categories/form_page.html")]
pub struct CategoryFormPage {
    pub layout: Layout,
    pub form: CategoryFormView,
}

async fn render_form(
    session: &Session,
    admin: &CurrentAdmin,
    headers: &HeaderMap,
    form: CategoryFormView,
) -> Result<Response> {
    if is_htmx(headers) {
        return Ok(CategoryModalTemplate { form }.into_response());
    }
    Ok(CategoryFormPage {
        layout: Layout::load(session, admin, "/categories").await?,
        form,
    }
    .into_response())
}

/// Categories list page handler.
#[instrument(skip(state, session, auth))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
) -> Result<impl IntoResponse> {
    let mut categories = state.api().list_categories().await?;
    categories.sort_by_key(|c| c.name.to_lowercase());

    Ok(CategoriesIndexTemplate {
        layout: Layout::load(&session, &auth.admin, "/categories").await?,
        categories,
    })
}

/// Blank category form.
#[instrument(skip(session, auth, headers))]
pub async fn new_form(
    session: Session,
    auth: RequireAdmin,
    headers: HeaderMap,
) -> Result<Response> {
    let form = CategoryFormView::new_category(&CategoryInput::default(), FieldErrors::new(), None);
    render_form(&session, &auth.admin, &headers, form).await
}

/// Create a category.
#[instrument(skip_all, fields(admin = %auth.admin.username))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response> {
    let input = CategoryInput::from_fields(MultipartFields::read(multipart).await?);

    let body = match input.validate() {
        Ok(body) => body,
        Err(errors) => {
            let form = CategoryFormView::new_category(&input, errors, None);
            return render_form(&session, &auth.admin, &headers, form).await;
        }
    };

    match state.api().create_category(auth.tokens.access(), body).await {
        Ok(category) => {
            info!(category_id = %category.id, "Category created");
            let flash = Flash::success(format!("Category \"{}\" created.", category.name));
            flash_and_redirect(&session, &headers, flash, "/categories").await
        }
        Err(e) => {
            let message = mutation_error(e, "category")?;
            let form = CategoryFormView::new_category(&input, FieldErrors::new(), Some(message));
            render_form(&session, &auth.admin, &headers, form).await
        }
    }
}

/// Category edit form.
#[instrument(skip(state, session, auth, headers))]
pub async fn edit_form(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    headers: HeaderMap,
    Path(id): Path<CategoryId>,
) -> Result<Response> {
    let category = state.api().get_category(id).await?;
    render_form(&session, &auth.admin, &headers, CategoryFormView::existing(&category)).await
}

/// Update a category. Without a new file the current image is kept.
#[instrument(skip_all, fields(admin = %auth.admin.username, category_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    headers: HeaderMap,
    Path(id): Path<CategoryId>,
    multipart: Multipart,
) -> Result<Response> {
    let input = CategoryInput::from_fields(MultipartFields::read(multipart).await?);

    let (errors, error) = match input.validate() {
        Ok(body) => match state.api().update_category(auth.tokens.access(), id, body).await {
            Ok(category) => {
                info!("Category updated");
                let flash = Flash::success(format!("Category \"{}\" saved.", category.name));
                return flash_and_redirect(&session, &headers, flash, "/categories").await;
            }
            Err(e) => (FieldErrors::new(), Some(mutation_error(e, "category")?)),
        },
        Err(errors) => (errors, None),
    };

    let category = state.api().get_category(id).await?;
    let form = CategoryFormView::resubmitted(&category, &input, errors, error);
    render_form(&session, &auth.admin, &headers, form).await
}

/// Delete a category. Products in it stay, minus the category.
#[instrument(skip(state, session, auth, headers))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    headers: HeaderMap,
    Path(id): Path<CategoryId>,
) -> Result<Response> {
    let flash = match state.api().delete_category(auth.tokens.access(), id).await {
        Ok(()) => {
            info!(category_id = %id, "Category deleted");
            Flash::success("Category deleted.")
        }
        Err(e) => Flash::error(mutation_error(e, "category")?),
    };

    flash_and_redirect(&session, &headers, flash, "/categories").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resubmitted_keeps_typed_values_and_image() {
        let category = Category {
            id: CategoryId::new(6),
            name: "Brûleurs".to_string(),
            slug: Some("bruleurs".to_string()),
            description: Some("Fioul et gaz".to_string()),
            image: Some("https://cdn.example.test/bruleurs.png".to_string()),
        };
        let input = CategoryInput {
            name: String::new(),
            description: "Gaz uniquement".to_string(),
            image: None,
        };
        let mut errors = FieldErrors::new();
        errors.add("name", "Required");

        let form = CategoryFormView::resubmitted(&category, &input, errors, None);
        assert_eq!(form.action, "/categories/6");
        assert_eq!(form.name, "");
        assert_eq!(form.description, "Gaz uniquement");
        assert_eq!(form.current_image.as_deref(), Some("https://cdn.example.test/bruleurs.png"));
        assert_eq!(form.errors.get("name"), Some("Required"));
    }
}
