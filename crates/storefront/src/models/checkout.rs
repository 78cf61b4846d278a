//! Checkout wizard state.
//!
//! The wizard has three steps: contact details, delivery, then review. Each
//! completed step is stored in the session as part of a [`CheckoutDraft`]
//! so that a visitor can go back and forth without retyping.

use boilerparts_api::{NewOrder, NewOrderLine, Wilaya};
use boilerparts_core::{Cart, DeliveryType, Email, Phone, Price, WilayaId};
use serde::{Deserialize, Serialize};

use super::validation::{FieldErrors, non_blank};

/// Minimum length of the customer's full name.
const MIN_NAME_LENGTH: usize = 3;

// =============================================================================
// Steps
// =============================================================================

/// A step of the checkout wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckoutStep {
    Contact,
    Delivery,
    Review,
}

impl CheckoutStep {
    /// 1-based step number shown in the progress bar.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Contact => 1,
            Self::Delivery => 2,
            Self::Review => 3,
        }
    }

    /// URL of the step's page.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Contact => "/checkout",
            Self::Delivery => "/checkout/delivery",
            Self::Review => "/checkout/review",
        }
    }
}

// =============================================================================
// Step 1: contact
// =============================================================================

/// Contact form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

/// Validated contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub full_name: String,
    pub phone: Phone,
    pub email: Option<Email>,
}

impl ContactForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when a field is invalid.
    pub fn validate(&self) -> Result<ContactDetails, FieldErrors> {
        let mut errors = FieldErrors::new();

        let full_name = non_blank(&self.full_name).unwrap_or_default();
        if full_name.chars().count() < MIN_NAME_LENGTH {
            errors.add("full_name", "Please enter your full name");
        }

        let phone = Phone::parse(&self.phone)
            .map_err(|e| errors.add("phone", e.to_string()))
            .ok();

        let email = match non_blank(&self.email) {
            Some(raw) => Email::parse(&raw)
                .map_err(|e| errors.add("email", e.to_string()))
                .ok(),
            None => None,
        };

        match phone {
            Some(phone) if errors.is_empty() => Ok(ContactDetails {
                full_name,
                phone,
                email,
            }),
            _ => Err(errors),
        }
    }
}

impl From<&ContactDetails> for ContactForm {
    fn from(details: &ContactDetails) -> Self {
        Self {
            full_name: details.full_name.clone(),
            phone: details.phone.as_str().to_string(),
            email: details
                .email
                .as_ref()
                .map(|e| e.as_str().to_string())
                .unwrap_or_default(),
        }
    }
}

// =============================================================================
// Step 2: delivery
// =============================================================================

/// Delivery form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryForm {
    #[serde(default)]
    pub wilaya: String,
    #[serde(default)]
    pub commune: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub delivery_type: String,
    #[serde(default)]
    pub note: String,
}

/// Validated delivery details, with the shipping price resolved from the
/// wilaya table at the time of validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub wilaya_id: WilayaId,
    pub wilaya_name: String,
    pub commune: String,
    pub address: Option<String>,
    pub delivery_type: DeliveryType,
    pub shipping_price: Price,
    pub note: Option<String>,
}

impl DeliveryForm {
    /// Validate the form against the wilaya table.
    ///
    /// The street address is required for home delivery only.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when a field is invalid.
    pub fn validate(&self, wilayas: &[Wilaya]) -> Result<DeliveryDetails, FieldErrors> {
        let mut errors = FieldErrors::new();

        let wilaya = self
            .wilaya
            .parse::<WilayaId>()
            .ok()
            .and_then(|id| wilayas.iter().find(|w| w.id == id && w.is_active));
        if wilaya.is_none() {
            errors.add("wilaya", "Please choose a wilaya");
        }

        let delivery_type = self.delivery_type.parse::<DeliveryType>().ok();
        if delivery_type.is_none() {
            errors.add("delivery_type", "Please choose a delivery method");
        }

        let commune = non_blank(&self.commune);
        if commune.is_none() {
            errors.add("commune", "Please enter your commune");
        }

        let address = non_blank(&self.address);
        if delivery_type == Some(DeliveryType::Home) && address.is_none() {
            errors.add("address", "A street address is required for home delivery");
        }

        match (wilaya, delivery_type, commune) {
            (Some(wilaya), Some(delivery_type), Some(commune)) if errors.is_empty() => {
                Ok(DeliveryDetails {
                    wilaya_id: wilaya.id,
                    wilaya_name: wilaya.name.clone(),
                    commune,
                    address,
                    delivery_type,
                    shipping_price: wilaya.shipping_price(delivery_type),
                    note: non_blank(&self.note),
                })
            }
            _ => Err(errors),
        }
    }
}

impl From<&DeliveryDetails> for DeliveryForm {
    fn from(details: &DeliveryDetails) -> Self {
        Self {
            wilaya: details.wilaya_id.to_string(),
            commune: details.commune.clone(),
            address: details.address.clone().unwrap_or_default(),
            delivery_type: details.delivery_type.as_str().to_string(),
            note: details.note.clone().unwrap_or_default(),
        }
    }
}

// =============================================================================
// Draft
// =============================================================================

/// Progress through the wizard, stored in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDraft {
    pub contact: Option<ContactDetails>,
    pub delivery: Option<DeliveryDetails>,
}

impl CheckoutDraft {
    /// First step that still needs input.
    #[must_use]
    pub const fn current_step(&self) -> CheckoutStep {
        match (&self.contact, &self.delivery) {
            (None, _) => CheckoutStep::Contact,
            (Some(_), None) => CheckoutStep::Delivery,
            (Some(_), Some(_)) => CheckoutStep::Review,
        }
    }

    /// Whether `step` may be shown: every earlier step must be complete.
    #[must_use]
    pub fn can_access(&self, step: CheckoutStep) -> bool {
        step <= self.current_step()
    }

    /// Shipping price, once delivery is chosen.
    #[must_use]
    pub fn shipping_price(&self) -> Option<Price> {
        self.delivery.as_ref().map(|d| d.shipping_price)
    }

    /// Cart total plus shipping.
    #[must_use]
    pub fn grand_total(&self, cart: &Cart) -> Price {
        cart.total_price() + self.shipping_price().unwrap_or(Price::ZERO)
    }

    /// The order to submit, or `None` while the draft is incomplete or the
    /// cart is empty.
    #[must_use]
    pub fn to_new_order(&self, cart: &Cart) -> Option<NewOrder> {
        let (contact, delivery) = (self.contact.as_ref()?, self.delivery.as_ref()?);
        if cart.is_empty() {
            return None;
        }

        Some(NewOrder {
            full_name: contact.full_name.clone(),
            phone: contact.phone.as_str().to_string(),
            email: contact.email.as_ref().map(|e| e.as_str().to_string()),
            wilaya: delivery.wilaya_id,
            commune: delivery.commune.clone(),
            address: delivery.address.clone().unwrap_or_default(),
            delivery_type: delivery.delivery_type,
            note: delivery.note.clone(),
            items: NewOrderLine::from_cart(cart),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use boilerparts_core::{CartItem, ProductId};

    use super::*;

    fn wilayas() -> Vec<Wilaya> {
        vec![
            Wilaya {
                id: WilayaId::new(16),
                code: 16,
                name: "Alger".into(),
                home_delivery_price: Price::from_dinars(600),
                desk_delivery_price: Price::from_dinars(400),
                is_active: true,
            },
            Wilaya {
                id: WilayaId::new(33),
                code: 33,
                name: "Illizi".into(),
                home_delivery_price: Price::from_dinars(1_800),
                desk_delivery_price: Price::from_dinars(1_200),
                is_active: false,
            },
        ]
    }

    fn contact_form() -> ContactForm {
        ContactForm {
            full_name: "Karim Benali".into(),
            phone: "0550 12 34 56".into(),
            email: String::new(),
        }
    }

    fn delivery_form(wilaya: &str, delivery_type: &str, address: &str) -> DeliveryForm {
        DeliveryForm {
            wilaya: wilaya.into(),
            commune: "Bab Ezzouar".into(),
            address: address.into(),
            delivery_type: delivery_type.into(),
            note: String::new(),
        }
    }

    #[test]
    fn test_contact_requires_name_and_valid_phone() {
        let form = ContactForm {
            full_name: " K ".into(),
            phone: "12345".into(),
            email: "not-an-email".into(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("full_name"));
        assert!(errors.has("phone"));
        assert!(errors.has("email"));
    }

    #[test]
    fn test_contact_email_is_optional() {
        let details = contact_form().validate().unwrap();
        assert_eq!(details.full_name, "Karim Benali");
        assert!(details.email.is_none());
    }

    #[test]
    fn test_delivery_resolves_shipping_price() {
        let details = delivery_form("16", "desk", "").validate(&wilayas()).unwrap();
        assert_eq!(details.wilaya_name, "Alger");
        assert_eq!(details.shipping_price, Price::from_dinars(400));
        assert!(details.address.is_none());
    }

    #[test]
    fn test_home_delivery_requires_address() {
        let errors = delivery_form("16", "home", "  ")
            .validate(&wilayas())
            .unwrap_err();
        assert!(errors.has("address"));
    }

    #[test]
    fn test_inactive_or_unknown_wilaya_is_rejected() {
        assert!(delivery_form("33", "desk", "").validate(&wilayas()).unwrap_err().has("wilaya"));
        assert!(delivery_form("99", "desk", "").validate(&wilayas()).unwrap_err().has("wilaya"));
        assert!(delivery_form("x", "desk", "").validate(&wilayas()).unwrap_err().has("wilaya"));
    }

    #[test]
    fn test_steps_unlock_in_order() {
        let mut draft = CheckoutDraft::default();
        assert_eq!(draft.current_step(), CheckoutStep::Contact);
        assert!(!draft.can_access(CheckoutStep::Delivery));

        draft.contact = Some(contact_form().validate().unwrap());
        assert_eq!(draft.current_step(), CheckoutStep::Delivery);
        assert!(draft.can_access(CheckoutStep::Contact));
        assert!(!draft.can_access(CheckoutStep::Review));

        let delivery = delivery_form("16", "home", "12 rue Didouche");
        draft.delivery = Some(delivery.validate(&wilayas()).unwrap());
        assert!(draft.can_access(CheckoutStep::Review));
    }

    #[test]
    fn test_new_order_needs_complete_draft_and_items() {
        let mut cart = Cart::new();
        let delivery = delivery_form("16", "home", "12 rue Didouche");
        let mut draft = CheckoutDraft {
            contact: Some(contact_form().validate().unwrap()),
            delivery: Some(delivery.validate(&wilayas()).unwrap()),
        };
        assert!(draft.to_new_order(&cart).is_none());

        let vanne = CartItem::new(ProductId::new(5), "Vanne", Price::from_dinars(2_000), None);
        cart.add(vanne.with_quantity(2));
        let order = draft.to_new_order(&cart).unwrap();
        assert_eq!(order.wilaya, WilayaId::new(16));
        assert_eq!(order.items.len(), 1);
        assert_eq!(draft.grand_total(&cart), Price::from_dinars(4_600));

        draft.delivery = None;
        assert!(draft.to_new_order(&cart).is_none());
    }
}
