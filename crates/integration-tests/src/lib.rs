//! End-to-end test harness for Boiler Parts.
//!
//! [`MockBackend`] stands in for the Django REST API on an ephemeral port and
//! records every request it receives. The storefront and back-office are
//! spawned against it and driven over real HTTP with a cookie-keeping
//! [`browser`].
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p boilerparts-integration-tests
//! ```
//!
//! No database or external service is needed.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Multipart, OriginalUri, Path, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};

/// Access token the mock issues to the staff account.
pub const STAFF_TOKEN: &str = "staff-access";

/// Access token the mock issues to the customer account.
pub const CUSTOMER_TOKEN: &str = "customer-access";

/// Password accepted for both mock accounts.
pub const PASSWORD: &str = "s3cret-pass";

/// The only product the mock catalog knows.
pub const PRODUCT_ID: i32 = 7;

/// Id given to every order the mock accepts.
pub const ORDER_ID: i32 = 1001;

/// Orders placed under this name fail with a 500.
pub const FAILING_ORDER_NAME: &str = "Order Service Down";

// =============================================================================
// Recorded requests
// =============================================================================

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    /// Text value, or the file size for file parts.
    pub value: String,
}

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub json: Option<Value>,
    pub parts: Vec<Part>,
}

impl Recorded {
    /// Text values of a repeated multipart field.
    #[must_use]
    pub fn texts(&self, name: &str) -> Vec<&str> {
        self.parts
            .iter()
            .filter(|p| p.name == name && p.file_name.is_none())
            .map(|p| p.value.as_str())
            .collect()
    }

    /// File parts of a multipart field.
    #[must_use]
    pub fn files(&self, name: &str) -> Vec<&Part> {
        self.parts
            .iter()
            .filter(|p| p.name == name && p.file_name.is_some())
            .collect()
    }
}

#[derive(Clone, Default)]
struct MockState {
    recorded: Arc<Mutex<Vec<Recorded>>>,
}

impl MockState {
    fn record(
        &self,
        method: Method,
        uri: &Uri,
        headers: &HeaderMap,
        json: Option<Value>,
        parts: Vec<Part>,
    ) {
        let header = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let entry = Recorded {
            method,
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            authorization: header(header::AUTHORIZATION),
            content_type: header(header::CONTENT_TYPE),
            json,
            parts,
        };
        self.recorded
            .lock()
            .expect("mock backend state poisoned")
            .push(entry);
    }
}

// =============================================================================
// Mock backend
// =============================================================================

/// In-process stand-in for the REST backend.
pub struct MockBackend {
    addr: SocketAddr,
    state: MockState,
}

impl MockBackend {
    /// Start the mock on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state = MockState::default();
        let api = Router::new()
            .route("/auth/login/", post(login))
            .route("/auth/me/", get(me))
            .route("/categories/", get(categories))
            .route("/tags/", get(tags).post(create_tag))
            .route("/wilayas/", get(wilayas))
            .route("/products/", get(list_products).post(create_product))
            .route("/products/{id}/", get(get_product).delete(delete_product))
            .route("/orders/", get(list_orders).post(create_order))
            .route("/broken/", get(broken));

        let router = Router::new().nest("/api", api).with_state(state.clone());
        let addr = serve(router).await;

        Self { addr, state }
    }

    /// Base URL of the mock API, with the trailing slash the client expects.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api/", self.addr)
    }

    /// Every request received so far, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if a handler panicked while holding the lock.
    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        self.state
            .recorded
            .lock()
            .expect("mock backend state poisoned")
            .clone()
    }

    /// The last request with `method` on `path` (relative to `/api`).
    #[must_use]
    pub fn last(&self, method: &Method, path: &str) -> Option<Recorded> {
        let full = format!("/api{path}");
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.method == *method && r.path == full)
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Authentication credentials were not provided."})),
    )
        .into_response()
}

fn product_json(id: i32, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "reference": "TC-900",
        "description": "Thermocouple universel 900 mm pour chaudières murales.",
        "price": "1500.00",
        "old_price": null,
        "stock": 5,
        "brand": "Vaillant",
        "image": null,
        "images": [],
        "categories": [{"id": 1, "name": "Thermostats", "slug": "thermostats"}],
        "tags": [{"id": 1, "name": "Vaillant"}],
        "is_active": true,
        "created_at": "2026-01-10T09:00:00Z"
    })
}

async fn login(
    State(state): State<MockState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(Method::POST, &uri, &headers, Some(body.clone()), Vec::new());

    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let access = match (username, password) {
        ("staff", PASSWORD) => STAFF_TOKEN,
        ("customer", PASSWORD) => CUSTOMER_TOKEN,
        _ => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "No active account found with the given credentials"})),
            )
                .into_response();
        }
    };

    Json(json!({"access": access, "refresh": format!("{access}-refresh")})).into_response()
}

async fn me(headers: HeaderMap) -> Response {
    match bearer(&headers) {
        Some(STAFF_TOKEN) => Json(json!({
            "id": 1,
            "username": "staff",
            "email": "staff@boilerparts.test",
            "first_name": "Amina",
            "last_name": "Haddad",
            "is_staff": true
        }))
        .into_response(),
        Some(CUSTOMER_TOKEN) => Json(json!({
            "id": 2,
            "username": "customer",
            "email": "client@boilerparts.test",
            "first_name": "Karim",
            "last_name": "Benali",
            "phone": "0550123456",
            "is_staff": false
        }))
        .into_response(),
        _ => unauthorized(),
    }
}

async fn categories() -> Json<Value> {
    Json(json!([
        {"id": 1, "name": "Thermostats", "slug": "thermostats", "description": null, "image": null},
        {"id": 2, "name": "Pompes", "slug": "pompes", "description": "Circulateurs", "image": null}
    ]))
}

async fn tags() -> Json<Value> {
    Json(json!([{"id": 1, "name": "Vaillant"}, {"id": 2, "name": "Saunier Duval"}]))
}

async fn create_tag(
    State(state): State<MockState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(Method::POST, &uri, &headers, Some(body), Vec::new());
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"name": ["tag with this name already exists."]})),
    )
        .into_response()
}

async fn wilayas() -> Json<Value> {
    Json(json!([
        {
            "id": 31, "code": 31, "name": "Oran",
            "home_delivery_price": "800.00", "desk_delivery_price": "500.00",
            "is_active": false
        },
        {
            "id": 16, "code": 16, "name": "Alger",
            "home_delivery_price": "600.00", "desk_delivery_price": "400.00",
            "is_active": true
        }
    ]))
}

async fn list_products(
    State(state): State<MockState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Json<Value> {
    state.record(Method::GET, &uri, &headers, None, Vec::new());
    Json(json!({
        "count": 1,
        "next": null,
        "previous": null,
        "results": [product_json(PRODUCT_ID, "Thermocouple universel")]
    }))
}

async fn get_product(Path(id): Path<i32>) -> Response {
    if id == PRODUCT_ID {
        Json(product_json(id, "Thermocouple universel")).into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response()
    }
}

async fn create_product(
    State(state): State<MockState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut parts = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let value = match &file_name {
            Some(_) => field.bytes().await.map(|b| b.len().to_string()).unwrap_or_default(),
            None => field.text().await.unwrap_or_default(),
        };
        parts.push(Part {
            name,
            file_name,
            content_type,
            value,
        });
    }
    let name = parts
        .iter()
        .find(|p| p.name == "name")
        .map(|p| p.value.clone())
        .unwrap_or_default();
    state.record(Method::POST, &uri, &headers, None, parts);

    if bearer(&headers) != Some(STAFF_TOKEN) {
        return unauthorized();
    }
    (StatusCode::CREATED, Json(product_json(PRODUCT_ID + 1, &name))).into_response()
}

async fn delete_product(
    State(state): State<MockState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    state.record(Method::DELETE, &uri, &headers, None, Vec::new());
    if bearer(&headers) != Some(STAFF_TOKEN) {
        return unauthorized();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_orders(
    State(state): State<MockState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    state.record(Method::GET, &uri, &headers, None, Vec::new());
    if bearer(&headers) != Some(STAFF_TOKEN) {
        return unauthorized();
    }
    Json(json!([])).into_response()
}

async fn create_order(
    State(state): State<MockState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(Method::POST, &uri, &headers, Some(body.clone()), Vec::new());
    if body["full_name"] == FAILING_ORDER_NAME {
        return (StatusCode::INTERNAL_SERVER_ERROR, "order service unavailable").into_response();
    }

    let quantity = body["items"][0]["quantity"].as_u64().unwrap_or(1);
    (
        StatusCode::CREATED,
        Json(json!({
            "id": ORDER_ID,
            "full_name": body["full_name"],
            "phone": body["phone"],
            "wilaya": "Alger",
            "commune": body["commune"],
            "delivery_type": body["delivery_type"],
            "shipping_price": "400.00",
            "total_price": format!("{}.00", 1500 * quantity + 400),
            "status": "pending",
            "items": [{
                "product": PRODUCT_ID,
                "product_name": "Thermocouple universel",
                "price": "1500.00",
                "quantity": quantity
            }],
            "created_at": "2026-02-01T10:30:00Z"
        })),
    )
        .into_response()
}

async fn broken() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
}

// =============================================================================
// Applications
// =============================================================================

/// Serve a router on an ephemeral local port.
async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no local address");

    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });

    addr
}

/// Start the storefront against `api_url` and return its base URL.
///
/// # Panics
///
/// Panics if the configuration or state cannot be built.
pub async fn spawn_storefront(api_url: &str) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener
        .local_addr()
        .expect("Listener has no local address");
    let base_url = format!("http://{addr}");

    let config = boilerparts_storefront::StorefrontConfig::from_lookup(|key| match key {
        "STOREFRONT_BASE_URL" => Some(base_url.clone()),
        "BACKEND_API_URL" => Some(api_url.to_string()),
        _ => None,
    })
    .expect("Invalid storefront test configuration");
    let state =
        boilerparts_storefront::AppState::new(config).expect("Failed to build storefront state");
    let app = boilerparts_storefront::app(state);

    tokio::spawn(async move {
        let service = app.into_make_service_with_connect_info::<SocketAddr>();
        let _ = axum::serve(listener, service).await;
    });

    base_url
}

/// Start the back-office against `api_url` and return its base URL.
///
/// # Panics
///
/// Panics if the configuration or state cannot be built.
pub async fn spawn_admin(api_url: &str) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener
        .local_addr()
        .expect("Listener has no local address");
    let base_url = format!("http://{addr}");

    let config = boilerparts_admin::AdminConfig::from_lookup(|key| match key {
        "ADMIN_BASE_URL" => Some(base_url.clone()),
        "BACKEND_API_URL" => Some(api_url.to_string()),
        _ => None,
    })
    .expect("Invalid admin test configuration");
    let state = boilerparts_admin::AppState::new(config).expect("Failed to build admin state");
    let app = boilerparts_admin::app(state);

    tokio::spawn(async move {
        let service = app.into_make_service_with_connect_info::<SocketAddr>();
        let _ = axum::serve(listener, service).await;
    });

    base_url
}

/// An HTTP client that keeps cookies, like a browser session.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build HTTP client")
}
