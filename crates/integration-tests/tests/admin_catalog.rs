//! Staff sign-in and product management through the back-office.

#![allow(clippy::unwrap_used)]

use boilerparts_integration_tests::{MockBackend, PASSWORD, browser, spawn_admin};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};

async fn sign_in(client: &reqwest::Client, admin: &str, username: &str) -> reqwest::Response {
    client
        .post(format!("{admin}/auth/login"))
        .form(&[("username", username), ("password", PASSWORD)])
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_customer_account_is_refused() {
    let backend = MockBackend::start().await;
    let admin = spawn_admin(&backend.api_url()).await;
    let client = browser();

    let response = sign_in(&client, &admin, "customer").await;
    assert_eq!(response.url().path(), "/auth/login");
    assert_eq!(response.url().query(), Some("error=not_staff"));
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("no access to the back-office")
    );

    // No staff session was kept
    let dashboard = client.get(format!("{admin}/")).send().await.unwrap();
    assert_eq!(dashboard.url().path(), "/auth/login");
}

#[tokio::test]
async fn test_wrong_password_rerenders_form() {
    let backend = MockBackend::start().await;
    let admin = spawn_admin(&backend.api_url()).await;

    let response = browser()
        .post(format!("{admin}/auth/login"))
        .form(&[("username", "staff"), ("password", "wrong")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Incorrect username or password."));
}

#[tokio::test]
async fn test_staff_creates_product_with_image() {
    let backend = MockBackend::start().await;
    let admin = spawn_admin(&backend.api_url()).await;
    let client = browser();

    let dashboard = sign_in(&client, &admin, "staff").await;
    assert_eq!(dashboard.url().path(), "/");
    let html = dashboard.text().await.unwrap();
    assert!(html.contains("Amina Haddad"));
    assert!(html.contains("Recent orders"));

    // Invalid submissions come back as the form with messages
    let invalid = Form::new()
        .text("name", "Circulateur UPS 25-60")
        .text("price", "abc")
        .text("stock", "2");
    let response = client
        .post(format!("{admin}/products"))
        .multipart(invalid)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("field-error"));
    assert!(backend.last(&Method::POST, "/products/").is_none());

    let image = Part::bytes(b"\x89PNG fake image".to_vec())
        .file_name("ups.png")
        .mime_str("image/png")
        .unwrap();
    let form = Form::new()
        .text("name", "Circulateur UPS 25-60")
        .text("reference", "UPS-2560")
        .text("price", "21 000")
        .text("stock", "2")
        .text("is_active", "on")
        .text("categories", "2")
        .text("tags", "1")
        .part("images", image);

    let listing = client
        .post(format!("{admin}/products"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(listing.url().path(), "/products");
    let html = listing.text().await.unwrap();
    assert!(html.contains("flash-success"));
    assert!(html.contains("Circulateur UPS 25-60"));

    let sent = backend.last(&Method::POST, "/products/").unwrap();
    assert_eq!(sent.authorization.as_deref(), Some("Bearer staff-access"));
    assert_eq!(sent.texts("price"), ["21000"]);
    assert_eq!(sent.texts("categories"), ["2"]);
    assert_eq!(sent.texts("is_active"), ["true"]);
    assert_eq!(sent.texts("old_price"), [""]);
    let files = sent.files("uploaded_images");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_name.as_deref(), Some("ups.png"));
    assert_eq!(files[0].content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn test_htmx_delete_redirects_with_header() {
    let backend = MockBackend::start().await;
    let admin = spawn_admin(&backend.api_url()).await;
    let client = browser();
    sign_in(&client, &admin, "staff").await;

    let response = client
        .post(format!("{admin}/products/7/delete"))
        .header("hx-request", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("hx-redirect").unwrap(), "/products");
    assert!(backend.last(&Method::DELETE, "/products/7/").is_some());
}
