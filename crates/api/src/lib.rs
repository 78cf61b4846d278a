//! Boiler Parts API - REST client for the Django backend.
//!
//! The backend owns products, categories, tags, orders, wilaya shipping
//! prices and user accounts. This crate wraps its REST API:
//!
//! - [`ApiClient::request`] is the single entry point for every call. It
//!   attaches the JSON content type (unless the body is multipart form
//!   data), the bearer token when one is given, and classifies the response
//!   body as empty, JSON or text. Any non-2xx status becomes
//!   [`ApiError::Status`].
//! - [`TokenStore`] persists the JWT pair between requests. The web
//!   binaries store it in the visitor's session.
//! - [`endpoints`] adds typed methods per resource on top of `request`.
//!
//! # Example
//!
//! ```rust,ignore
//! use boilerparts_api::{ApiClient, ApiConfig, ProductFilter};
//!
//! let client = ApiClient::new(&ApiConfig::new("https://api.example.dz/api/".parse()?))?;
//! let page = client.list_products(&ProductFilter::default()).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod client;
mod config;
pub mod endpoints;
mod error;
mod form;
pub mod models;
mod request;
mod tokens;

pub use client::ApiClient;
pub use config::ApiConfig;
pub use endpoints::orders::OrderFilter;
pub use endpoints::products::{ProductFilter, ProductSort};
pub use error::ApiError;
pub use form::{FormData, FormValue};
pub use models::*;
pub use request::{ApiBody, RequestBody, RequestOptions};
pub use tokens::{AuthTokens, MemoryTokenStore, SESSION_TOKENS_KEY, TokenStore};
