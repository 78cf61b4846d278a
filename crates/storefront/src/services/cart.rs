//! Cart persistence in the visitor's session.
//!
//! The cart is created empty on first load and survives reloads for as long
//! as the session lives.

use boilerparts_core::Cart;
use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;

use crate::models::session_keys;

/// Load the visitor's cart, empty if none was stored.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load(session: &Session) -> Result<Cart, SessionError> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Store the visitor's cart.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save(session: &Session, cart: &Cart) -> Result<(), SessionError> {
    session.insert(session_keys::CART, cart).await
}

/// Apply `change` to the stored cart and save it back.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn update(
    session: &Session,
    change: impl FnOnce(&mut Cart),
) -> Result<Cart, SessionError> {
    let mut cart = load(session).await?;
    change(&mut cart);
    save(session, &cart).await?;
    Ok(cart)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use boilerparts_core::{CartItem, Price, ProductId};
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_missing_cart_loads_empty() {
        let cart = load(&session()).await.unwrap();
        assert!(cart.is_empty());
        assert!(!cart.is_open());
    }

    #[tokio::test]
    async fn test_update_persists() {
        let session = session();
        update(&session, |cart| {
            cart.add(CartItem::new(ProductId::new(1), "Sonde", Price::from_dinars(1_500), None));
            cart.open();
        })
        .await
        .unwrap();

        let cart = load(&session).await.unwrap();
        assert_eq!(cart.total_items(), 1);
        assert!(cart.is_open());
    }
}
