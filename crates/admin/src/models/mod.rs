//! Session-held state and form models for the back-office.

pub mod flash;
pub mod forms;
pub mod session;
pub mod validation;

pub use flash::Flash;
pub use forms::{CategoryInput, ProductInput, ShippingInput, TagInput, Upload};
pub use session::{CurrentAdmin, keys as session_keys};
pub use validation::FieldErrors;
