//! Session-backed visitor state.
//!
//! - `cart` - The shopping cart, read-modify-written within one request
//! - `checkout` - The checkout wizard draft

pub mod cart;
pub mod checkout;
