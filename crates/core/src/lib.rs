//! Boiler Parts Core - Shared types library.
//!
//! This crate provides the types used by every Boiler Parts component:
//! - `api` - REST client for the Django backend
//! - `storefront` - Public-facing shop
//! - `admin` - Back-office for catalog, orders and shipping prices
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. The cart store lives here so it can be persisted by whichever
//! layer owns the visitor's storage.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, phones and statuses
//! - [`cart`] - The shopping cart store

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartItem, MAX_QUANTITY, MIN_QUANTITY};
pub use types::*;
