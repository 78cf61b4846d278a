//! Tag management. Tags are a bare name, edited inline on the list page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use boilerparts_api::Tag;
use boilerparts_core::TagId;
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{CurrentAdmin, FieldErrors, Flash, TagInput};
use crate::routes::{Layout, flash_and_redirect, mutation_error};
use crate::state::AppState;

/// Tags page template.
#[derive(Template, WebTemplate)]
#[template(path = "tags/index.html")]
pub struct TagsIndexTemplate {
    pub layout: Layout,
    pub tags: Vec<Tag>,
    /// Value of the "new tag" field after a failed create.
    pub new_name: String,
    pub errors: FieldErrors,
}

async fn render(
    state: &AppState,
    session: &Session,
    admin: &CurrentAdmin,
    new_name: String,
    errors: FieldErrors,
) -> Result<Response> {
    let mut tags = state.api().list_tags().await?;
    tags.sort_by_key(|t| t.name.to_lowercase());

    Ok(TagsIndexTemplate {
        layout: Layout::load(session, admin, "/tags").await?,
        tags,
        new_name,
        errors,
    }
    .into_response())
}

/// Tags page handler.
#[instrument(skip(state, session, auth))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
) -> Result<Response> {
    render(&state, &session, &auth.admin, String::new(), FieldErrors::new()).await
}

/// Create a tag.
#[instrument(skip(state, session, auth, headers))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    headers: HeaderMap,
    Form(input): Form<TagInput>,
) -> Result<Response> {
    let name = match input.validate() {
        Ok(name) => name,
        Err(errors) => {
            return render(&state, &session, &auth.admin, input.name.clone(), errors).await;
        }
    };

    let flash = match state.api().create_tag(auth.tokens.access(), name).await {
        Ok(tag) => {
            info!(tag_id = %tag.id, "Tag created");
            Flash::success(format!("Tag \"{}\" created.", tag.name))
        }
        Err(e) => Flash::error(mutation_error(e, "tag")?),
    };

    flash_and_redirect(&session, &headers, flash, "/tags").await
}

/// Rename a tag.
#[instrument(skip(state, session, auth, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    headers: HeaderMap,
    Path(id): Path<TagId>,
    Form(input): Form<TagInput>,
) -> Result<Response> {
    let flash = match input.validate() {
        Err(_) => Flash::error("A tag needs a name."),
        Ok(name) => match state.api().update_tag(auth.tokens.access(), id, name).await {
            Ok(tag) => Flash::success(format!("Tag renamed to \"{}\".", tag.name)),
            Err(e) => Flash::error(mutation_error(e, "tag")?),
        },
    };

    flash_and_redirect(&session, &headers, flash, "/tags").await
}

/// Delete a tag.
#[instrument(skip(state, session, auth, headers))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    auth: RequireAdmin,
    headers: HeaderMap,
    Path(id): Path<TagId>,
) -> Result<Response> {
    let flash = match state.api().delete_tag(auth.tokens.access(), id).await {
        Ok(()) => {
            info!(tag_id = %id, "Tag deleted");
            Flash::success("Tag deleted.")
        }
        Err(e) => Flash::error(mutation_error(e, "tag")?),
    };

    flash_and_redirect(&session, &headers, flash, "/tags").await
}
