//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                           - Dashboard overview
//!
//! # Auth (staff accounts only)
//! GET  /auth/login                 - Login page
//! POST /auth/login                 - Login action (rate limited)
//! POST /auth/logout                - Logout
//!
//! # Products (multipart, modal forms)
//! GET  /products                   - Product listing with search
//! GET  /products/new               - Create form
//! POST /products                   - Create
//! GET  /products/{id}/edit         - Edit form
//! POST /products/{id}              - Update
//! POST /products/{id}/delete       - Delete
//!
//! # Categories (multipart, modal forms)
//! GET  /categories                 - Category listing
//! GET  /categories/new             - Create form
//! POST /categories                 - Create
//! GET  /categories/{id}/edit       - Edit form
//! POST /categories/{id}            - Update
//! POST /categories/{id}/delete     - Delete
//!
//! # Tags (JSON)
//! GET  /tags                       - Tag listing with inline forms
//! POST /tags                       - Create
//! POST /tags/{id}                  - Rename
//! POST /tags/{id}/delete           - Delete
//!
//! # Orders
//! GET  /orders                     - Order listing with status filter and search
//! GET  /orders/{id}                - Order detail
//! POST /orders/{id}/status         - Change status
//! POST /orders/{id}/delete         - Delete
//!
//! # Shipping
//! GET  /shipping                   - Delivery prices per wilaya
//! POST /shipping/{id}              - Update one wilaya
//! ```
//!
//! Modal forms are fetched with HTMX into `#modal`. Without HTMX the same
//! URLs render full pages, so every action also works as a plain form post.

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod shipping;
pub mod tags;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use boilerparts_api::ApiError;
use tower_sessions::Session;
use tracing::warn;

use crate::error::Result;
use crate::middleware::login_rate_limiter;
use crate::models::forms::UPLOAD_BODY_LIMIT;
use crate::models::{CurrentAdmin, Flash};
use crate::state::AppState;

// =============================================================================
// Shared Views
// =============================================================================

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub username: String,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            username: admin.username.clone(),
        }
    }
}

/// Data every full page needs: sidebar, active section and pending flash.
#[derive(Debug, Clone)]
pub struct Layout {
    pub admin_user: AdminUserView,
    pub current_path: &'static str,
    pub flash: Option<Flash>,
}

impl Layout {
    /// Build the layout, consuming the pending flash message.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn load(
        session: &Session,
        admin: &CurrentAdmin,
        current_path: &'static str,
    ) -> Result<Self> {
        Ok(Self {
            admin_user: AdminUserView::from(admin),
            current_path,
            flash: Flash::take(session).await?,
        })
    }
}

/// A selectable option in a filter or multi-select.
#[derive(Debug, Clone)]
pub struct ChoiceView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Whether the request was issued by htmx.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("hx-request")
        .is_some_and(|v| v.as_bytes() == b"true")
}

/// Navigate after a successful action.
///
/// HTMX requests get `HX-Redirect` so the browser loads the full page (and
/// the modal closes); plain form posts get a 303.
#[must_use]
pub fn see_other(headers: &HeaderMap, to: &str) -> Response {
    if is_htmx(headers) {
        (StatusCode::OK, [("HX-Redirect", to.to_string())]).into_response()
    } else {
        Redirect::to(to).into_response()
    }
}

/// Store a flash message and navigate.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn flash_and_redirect(
    session: &Session,
    headers: &HeaderMap,
    flash: Flash,
    to: &str,
) -> Result<Response> {
    flash.push(session).await?;
    Ok(see_other(headers, to))
}

/// Operator-facing message for a failed backend mutation.
///
/// An expired token is returned as an error so it ends in the login
/// redirect; anything else becomes an inline message.
///
/// # Errors
///
/// Returns the error unchanged when the token was rejected.
pub fn mutation_error(err: ApiError, subject: &str) -> Result<String> {
    if err.is_unauthorized() {
        return Err(err.into());
    }
    if err.is_not_found() {
        return Ok(format!("This {subject} no longer exists."));
    }
    if let ApiError::Status { status, body } = &err
        && *status == StatusCode::BAD_REQUEST
    {
        return Ok(format!(
            "The backend rejected the {subject}: {}",
            describe_rejection(body)
        ));
    }

    warn!(error = %err, subject, "Backend mutation failed");
    Ok(format!(
        "Could not save the {subject}, the backend is unavailable. Please retry."
    ))
}

/// Flatten a validation body such as `{"name": ["This field is required."]}`
/// into `name: This field is required.`.
fn describe_rejection(body: &str) -> String {
    let Ok(serde_json::Value::Object(fields)) = serde_json::from_str::<serde_json::Value>(body)
    else {
        return body.trim().to_string();
    };

    fields
        .iter()
        .map(|(field, messages)| {
            let text = match messages {
                serde_json::Value::Array(items) => items
                    .iter()
                    .map(|m| m.as_str().map_or_else(|| m.to_string(), str::to_string))
                    .collect::<Vec<_>>()
                    .join(" "),
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if field == "non_field_errors" || field == "detail" {
                text
            } else {
                format!("{field}: {text}")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Routers
// =============================================================================

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    let login = Router::new()
        .route("/login", post(auth::login))
        .layer(login_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/logout", post(auth::logout))
        .merge(login)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new_form))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit_form))
        .route("/{id}/delete", post(products::delete))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route("/new", get(categories::new_form))
        .route("/{id}", post(categories::update))
        .route("/{id}/edit", get(categories::edit_form))
        .route("/{id}/delete", post(categories::delete))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// Create the tag routes router.
pub fn tag_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(tags::index).post(tags::create))
        .route("/{id}", post(tags::update))
        .route("/{id}/delete", post(tags::delete))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
        .route("/{id}/delete", post(orders::delete))
}

/// Create the shipping routes router.
pub fn shipping_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shipping::index))
        .route("/{id}", post(shipping::update))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/tags", tag_routes())
        .nest("/orders", order_routes())
        .nest("/shipping", shipping_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;
    use axum::http::header::LOCATION;

    use super::*;

    fn htmx_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("hx-request", HeaderValue::from_static("true"));
        headers
    }

    #[test]
    fn test_see_other_plain_and_htmx() {
        let plain = see_other(&HeaderMap::new(), "/products");
        assert_eq!(plain.status(), StatusCode::SEE_OTHER);
        assert_eq!(plain.headers().get(LOCATION).unwrap(), "/products");

        let htmx = see_other(&htmx_headers(), "/products");
        assert_eq!(htmx.status(), StatusCode::OK);
        assert_eq!(htmx.headers().get("hx-redirect").unwrap(), "/products");
    }

    #[test]
    fn test_describe_rejection() {
        assert_eq!(
            describe_rejection(
                r#"{"name": ["This field is required."], "price": ["A valid number is required."]}"#
            ),
            "name: This field is required.; price: A valid number is required."
        );
        assert_eq!(
            describe_rejection(r#"{"non_field_errors": ["Duplicate reference."]}"#),
            "Duplicate reference."
        );
        assert_eq!(describe_rejection("Bad Request"), "Bad Request");
    }

    #[test]
    fn test_mutation_error_messages() {
        let rejected = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            body: r#"{"name": ["Already exists."]}"#.to_string(),
        };
        assert_eq!(
            mutation_error(rejected, "tag").unwrap(),
            "The backend rejected the tag: name: Already exists."
        );

        let gone = ApiError::Status {
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        };
        assert_eq!(mutation_error(gone, "order").unwrap(), "This order no longer exists.");

        let expired = ApiError::Status {
            status: StatusCode::UNAUTHORIZED,
            body: String::new(),
        };
        assert!(mutation_error(expired, "order").is_err());
    }
}
