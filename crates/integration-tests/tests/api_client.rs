//! The REST client against the mock backend: status handling, body
//! classification, multipart uploads and bearer tokens.

#![allow(clippy::unwrap_used)]

use boilerparts_api::{
    ApiClient, ApiConfig, ApiError, Credentials, FormData, MemoryTokenStore, ProductFilter,
    RequestOptions, TokenStore,
};
use boilerparts_core::ProductId;
use boilerparts_integration_tests::{MockBackend, PASSWORD, PRODUCT_ID, STAFF_TOKEN};
use reqwest::{Method, StatusCode, Url};
use secrecy::SecretString;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn client(backend: &MockBackend) -> ApiClient {
    ApiClient::new(&ApiConfig::new(Url::parse(&backend.api_url()).unwrap())).unwrap()
}

fn staff_token() -> SecretString {
    SecretString::from(STAFF_TOKEN)
}

#[tokio::test]
async fn test_reads_reference_data_and_products() {
    let backend = MockBackend::start().await;
    let api = client(&backend);

    let categories = api.list_categories().await.unwrap();
    assert_eq!(categories.len(), 2);

    let wilayas = api.list_wilayas().await.unwrap();
    assert_eq!(wilayas[0].label(), "16 - Alger");
    assert!(!wilayas[1].is_active);

    let page = api.list_products(&ProductFilter::default()).await.unwrap();
    assert_eq!(page.count, 1);
    assert!(!page.has_next());

    let product = api.get_product(ProductId::new(PRODUCT_ID)).await.unwrap();
    assert_eq!(product.reference.as_deref(), Some("TC-900"));
    assert!(product.in_stock());
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let backend = MockBackend::start().await;
    let err = client(&backend)
        .get_product(ProductId::new(99))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(!err.is_unauthorized());
}

#[tokio::test]
async fn test_server_error_keeps_status_and_body() {
    let backend = MockBackend::start().await;
    let err = client(&backend)
        .request("broken/", RequestOptions::get())
        .await
        .unwrap_err();

    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body.contains("upstream exploded"));
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_truncated_error_body_keeps_status() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0_u8; 4096];
        let _ = socket.read(&mut request).await;
        // Promise more bytes than are sent, then hang up.
        socket
            .write_all(b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 100\r\n\r\nshort")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let api = ApiClient::new(&ApiConfig::new(
        Url::parse(&format!("http://{addr}/api/")).unwrap(),
    ))
    .unwrap();
    let err = api.request("x/", RequestOptions::get()).await.unwrap_err();

    assert_eq!(err.status_code(), Some(StatusCode::SERVICE_UNAVAILABLE));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_validation_error_is_reported() {
    let backend = MockBackend::start().await;
    let err = client(&backend)
        .create_tag(&staff_token(), "Vaillant")
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.status_code(), Some(StatusCode::BAD_REQUEST));

    let sent = backend.last(&Method::POST, "/tags/").unwrap();
    assert_eq!(sent.json.unwrap()["name"], "Vaillant");
    assert_eq!(sent.content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn test_delete_accepts_empty_response() {
    let backend = MockBackend::start().await;
    client(&backend)
        .delete_product(&staff_token(), ProductId::new(PRODUCT_ID))
        .await
        .unwrap();

    let sent = backend.last(&Method::DELETE, "/products/7/").unwrap();
    assert_eq!(sent.authorization.as_deref(), Some("Bearer staff-access"));
}

#[tokio::test]
async fn test_multipart_upload_sets_its_own_content_type() {
    let backend = MockBackend::start().await;
    let form = FormData::new()
        .text("name", "Vanne 3 voies")
        .text("price", "8900")
        .text("categories", "1")
        .text("categories", "2")
        .file("uploaded_images", b"PNGDATA".to_vec(), "front.png", "image/png");

    let created = client(&backend)
        .create_product(&staff_token(), form)
        .await
        .unwrap();
    assert_eq!(created.name, "Vanne 3 voies");

    let sent = backend.last(&Method::POST, "/products/").unwrap();
    assert!(
        sent.content_type
            .as_deref()
            .unwrap()
            .starts_with("multipart/form-data; boundary=")
    );
    assert_eq!(sent.texts("categories"), ["1", "2"]);
    let files = sent.files("uploaded_images");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_name.as_deref(), Some("front.png"));
    assert_eq!(files[0].value, "7");
}

#[tokio::test]
async fn test_bearer_token_only_when_given() {
    let backend = MockBackend::start().await;
    let api = client(&backend);

    api.list_products(&ProductFilter::default()).await.unwrap();
    let anonymous = backend.last(&Method::GET, "/products/").unwrap();
    assert_eq!(anonymous.authorization, None);

    api.list_orders(&staff_token(), &Default::default())
        .await
        .unwrap();
    let staff = backend.last(&Method::GET, "/orders/").unwrap();
    assert_eq!(staff.authorization.as_deref(), Some("Bearer staff-access"));
}

#[tokio::test]
async fn test_login_saves_tokens_and_reads_profile() {
    let backend = MockBackend::start().await;
    let api = client(&backend);
    let store = MemoryTokenStore::new();

    let wrong = Credentials {
        username: "staff".to_string(),
        password: "nope".to_string(),
    };
    assert!(api.login(&wrong, &store).await.unwrap_err().is_unauthorized());
    assert!(store.load().await.unwrap().is_none());

    let credentials = Credentials {
        username: "staff".to_string(),
        password: PASSWORD.to_string(),
    };
    api.login(&credentials, &store).await.unwrap();
    assert!(store.load().await.unwrap().is_some());

    let profile = api.current_user(&store).await.unwrap();
    assert!(profile.is_staff);
    assert_eq!(profile.display_name(), "Amina Haddad");

    api.logout(&store).await.unwrap();
    assert!(store.load().await.unwrap().is_none());
    assert!(api.current_user(&store).await.unwrap_err().is_unauthorized());
}
