//! Checkout draft persistence in the visitor's session.

use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;

use crate::models::{CheckoutDraft, session_keys};

/// Load the draft, empty if the wizard was not started.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn load(session: &Session) -> Result<CheckoutDraft, SessionError> {
    Ok(session
        .get::<CheckoutDraft>(session_keys::CHECKOUT)
        .await?
        .unwrap_or_default())
}

/// Store the draft.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save(session: &Session, draft: &CheckoutDraft) -> Result<(), SessionError> {
    session.insert(session_keys::CHECKOUT, draft).await
}

/// Forget the draft after a successful order.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear(session: &Session) -> Result<(), SessionError> {
    session
        .remove::<CheckoutDraft>(session_keys::CHECKOUT)
        .await?;
    Ok(())
}
