//! Typed methods per backend resource, built on [`ApiClient::request`].
//!
//! [`ApiClient::request`]: crate::ApiClient::request

pub mod auth;
pub mod categories;
pub mod orders;
pub mod products;
pub mod tags;
pub mod wilayas;

/// Path of a single resource, e.g. `products/12/`.
pub(crate) fn detail_path(collection: &str, id: impl std::fmt::Display) -> String {
    format!("{collection}{id}/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_path() {
        assert_eq!(detail_path("products/", 12), "products/12/");
    }
}
