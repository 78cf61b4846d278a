//! Resources exposed by the backend.
//!
//! Field names follow the backend's JSON. Optional or backend-version
//! dependent fields default so that older payloads still deserialize.

use boilerparts_core::{
    CategoryId, DeliveryType, OrderId, OrderStatus, Price, ProductId, ProductImageId, TagId,
    UserId, WilayaId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Pagination
// =============================================================================

/// A page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of results across all pages.
    pub count: u64,
    /// URL of the next page.
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page.
    #[serde(default)]
    pub previous: Option<String>,
    /// Results on this page.
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Whether another page follows.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Number of pages for a given page size.
    #[must_use]
    pub fn total_pages(&self, page_size: u32) -> u32 {
        if page_size == 0 {
            return 1;
        }
        let pages = self.count.div_ceil(u64::from(page_size)).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

/// List endpoints answer either a paginated envelope or a bare array,
/// depending on whether pagination is enabled for the view.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Paginated(Page<T>),
    Plain(Vec<T>),
}

impl<T> From<Listing<T>> for Page<T> {
    fn from(listing: Listing<T>) -> Self {
        match listing {
            Listing::Paginated(page) => page,
            Listing::Plain(results) => Self {
                count: results.len() as u64,
                next: None,
                previous: None,
                results,
            },
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A free-form product tag (e.g. a boiler brand or model).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// An additional product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: ProductImageId,
    pub image: String,
}

/// A spare part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Manufacturer part number.
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    /// Price before discount, shown struck through.
    #[serde(default)]
    pub old_price: Option<Price>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub brand: Option<String>,
    /// Main image URL.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Whether the product can be ordered.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.is_active && self.stock > 0
    }

    /// Main image, falling back to the first gallery image.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.image
            .as_deref()
            .or_else(|| self.images.first().map(|img| img.image.as_str()))
    }

    /// Whether the product is discounted.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.old_price.is_some_and(|old| old > self.price)
    }
}

const fn default_true() -> bool {
    true
}

// =============================================================================
// Shipping
// =============================================================================

/// A wilaya and its delivery prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wilaya {
    pub id: WilayaId,
    /// Official wilaya number (1-58).
    pub code: u8,
    pub name: String,
    pub home_delivery_price: Price,
    pub desk_delivery_price: Price,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Wilaya {
    /// Shipping price for a delivery type.
    #[must_use]
    pub const fn shipping_price(&self, delivery_type: DeliveryType) -> Price {
        match delivery_type {
            DeliveryType::Home => self.home_delivery_price,
            DeliveryType::Desk => self.desk_delivery_price,
        }
    }

    /// Display label, e.g. `16 - Alger`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{:02} - {}", self.code, self.name)
    }
}

/// New delivery prices for a wilaya.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WilayaPrices {
    pub home_delivery_price: Price,
    pub desk_delivery_price: Price,
    pub is_active: bool,
}

// =============================================================================
// Orders
// =============================================================================

/// An order line as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product: Option<ProductId>,
    pub product_name: String,
    pub price: Price,
    pub quantity: u32,
}

impl OrderLine {
    /// Price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub full_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Wilaya name as recorded on the order.
    pub wilaya: String,
    #[serde(default)]
    pub commune: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    pub shipping_price: Price,
    pub total_price: Price,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Sum of the order lines, excluding shipping.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(OrderLine::line_total).sum()
    }
}

/// A line of an order being submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrderLine {
    pub product: ProductId,
    pub quantity: u32,
}

/// An order being submitted from the checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub full_name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub wilaya: WilayaId,
    pub commune: String,
    pub address: String,
    pub delivery_type: DeliveryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub items: Vec<NewOrderLine>,
}

impl NewOrderLine {
    /// Order lines for every cart line.
    #[must_use]
    pub fn from_cart(cart: &boilerparts_core::Cart) -> Vec<Self> {
        cart.items()
            .iter()
            .map(|item| Self {
                product: item.id,
                quantity: item.quantity,
            })
            .collect()
    }
}

// =============================================================================
// Accounts
// =============================================================================

/// The logged-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_staff: bool,
}

impl UserProfile {
    /// Full name, falling back to the username.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Login credentials.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Account registration payload.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_accepts_paginated_and_plain() {
        let paginated: Listing<Tag> = serde_json::from_value(json!({
            "count": 12,
            "next": "http://api/tags/?page=2",
            "previous": null,
            "results": [{"id": 1, "name": "Saunier Duval"}]
        }))
        .unwrap();
        let page = Page::from(paginated);
        assert_eq!(page.count, 12);
        assert!(page.has_next());

        let plain: Listing<Tag> = serde_json::from_value(json!([
            {"id": 1, "name": "Chaffoteaux"},
            {"id": 2, "name": "Vaillant"}
        ]))
        .unwrap();
        let page = Page::from(plain);
        assert_eq!(page.count, 2);
        assert!(!page.has_next());
    }

    #[test]
    fn test_total_pages() {
        let page: Page<Tag> = Page {
            count: 25,
            ..Page::default()
        };
        assert_eq!(page.total_pages(12), 3);
        assert_eq!(Page::<Tag>::default().total_pages(12), 1);
    }

    #[test]
    fn test_product_deserializes_minimal_payload() {
        let product: Product = serde_json::from_value(json!({
            "id": 7,
            "name": "Pompe de circulation",
            "price": "14500.00",
            "images": [{"id": 3, "image": "/media/pompe.jpg"}]
        }))
        .unwrap();

        assert!(product.is_active);
        assert!(!product.in_stock());
        assert_eq!(product.primary_image(), Some("/media/pompe.jpg"));
        assert_eq!(product.price, Price::from_dinars(14_500));
    }

    #[test]
    fn test_wilaya_shipping_price() {
        let wilaya: Wilaya = serde_json::from_value(json!({
            "id": 16,
            "code": 16,
            "name": "Alger",
            "home_delivery_price": "600.00",
            "desk_delivery_price": "400.00"
        }))
        .unwrap();

        assert_eq!(wilaya.shipping_price(DeliveryType::Home), Price::from_dinars(600));
        assert_eq!(wilaya.shipping_price(DeliveryType::Desk), Price::from_dinars(400));
        assert_eq!(wilaya.label(), "16 - Alger");
    }

    #[test]
    fn test_new_order_from_cart() {
        let mut cart = boilerparts_core::Cart::new();
        let item = boilerparts_core::CartItem::new(
            ProductId::new(2),
            "Vanne",
            Price::from_dinars(900),
            None,
        );
        cart.add(item.with_quantity(3));
        let lines = NewOrderLine::from_cart(&cart);
        assert_eq!(
            lines,
            vec![NewOrderLine {
                product: ProductId::new(2),
                quantity: 3
            }]
        );
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let profile: UserProfile =
            serde_json::from_value(json!({"id": 1, "username": "karim"})).unwrap();
        assert_eq!(profile.display_name(), "karim");
    }
}
