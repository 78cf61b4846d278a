//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use boilerparts_api::UserProfile;
use boilerparts_core::UserId;

/// Session-stored customer identity.
///
/// Minimal data stored in the session to identify the logged-in customer.
/// The JWT pair lives next to it under
/// [`boilerparts_api::SESSION_TOKENS_KEY`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentCustomer {
    /// Backend user ID.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Name shown in the header.
    pub display_name: String,
    /// Email address, used to prefill the checkout.
    pub email: Option<String>,
    /// Phone number, used to prefill the checkout.
    pub phone: Option<String>,
}

impl From<&UserProfile> for CurrentCustomer {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            username: profile.username.clone(),
            display_name: profile.display_name(),
            email: Some(profile.email.clone()).filter(|e| !e.is_empty()),
            phone: profile.phone.clone(),
        }
    }
}

/// Session keys for visitor state.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    /// Key for the shopping cart.
    pub const CART: &str = "cart";

    /// Key for the checkout wizard draft.
    pub const CHECKOUT: &str = "checkout";

    /// Key for the number of the last submitted order (success page).
    pub const LAST_ORDER: &str = "last_order";
}
