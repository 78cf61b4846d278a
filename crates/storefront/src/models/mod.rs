//! Session-held state and form models for storefront visitors.

pub mod checkout;
pub mod session;
pub mod validation;

pub use checkout::{
    CheckoutDraft, CheckoutStep, ContactDetails, ContactForm, DeliveryDetails, DeliveryForm,
};
pub use session::{CurrentCustomer, keys as session_keys};
pub use validation::FieldErrors;
