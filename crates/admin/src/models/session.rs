//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};

use boilerparts_api::UserProfile;
use boilerparts_core::UserId;

/// Session-stored staff identity.
///
/// Only built for profiles with `is_staff`; the JWT pair is stored next to
/// it under [`boilerparts_api::SESSION_TOKENS_KEY`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Backend user ID.
    pub id: UserId,
    pub username: String,
    /// Display name for the sidebar.
    pub name: String,
    pub email: Option<String>,
}

impl CurrentAdmin {
    /// Identity for a staff profile, `None` for regular customers.
    #[must_use]
    pub fn from_staff(profile: &UserProfile) -> Option<Self> {
        profile.is_staff.then(|| Self {
            id: profile.id,
            username: profile.username.clone(),
            name: profile.display_name(),
            email: Some(profile.email.clone()).filter(|e| !e.is_empty()),
        })
    }
}

/// Session keys for admin state.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the one-shot flash message.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(is_staff: bool) -> UserProfile {
        UserProfile {
            id: UserId::new(3),
            username: "amina".to_string(),
            email: String::new(),
            first_name: "Amina".to_string(),
            last_name: "Haddad".to_string(),
            phone: None,
            is_staff,
        }
    }

    #[test]
    fn test_only_staff_become_admins() {
        assert!(CurrentAdmin::from_staff(&profile(false)).is_none());

        let admin = CurrentAdmin::from_staff(&profile(true));
        assert!(admin.as_ref().is_some_and(|a| a.username == "amina"));
        assert!(admin.is_some_and(|a| a.email.is_none()));
    }
}
