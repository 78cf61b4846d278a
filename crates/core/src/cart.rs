//! Shopping cart store.
//!
//! The cart is an ordered list of lines keyed by product id. It knows
//! nothing about where it is persisted: the storefront keeps it in the
//! visitor's session and writes it back after every mutation.
//!
//! Quantity rules:
//! - every line holds between [`MIN_QUANTITY`] and [`MAX_QUANTITY`] units;
//! - adding a product that is already in the cart increments its line;
//! - setting a quantity below [`MIN_QUANTITY`] removes the line.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Smallest quantity a line can hold.
pub const MIN_QUANTITY: u32 = 1;

/// Largest quantity a line can hold.
pub const MAX_QUANTITY: u32 = 10;

/// A product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product identifier (unique within a cart).
    pub id: ProductId,
    /// Product name, denormalized for display.
    pub name: String,
    /// Unit price at the time the product was added.
    pub price: Price,
    /// Main product image URL.
    pub image: Option<String>,
    /// Number of units, always within `MIN_QUANTITY..=MAX_QUANTITY`.
    pub quantity: u32,
}

impl CartItem {
    /// Create a line with a single unit.
    #[must_use]
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: Price,
        image: Option<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            image,
            quantity: MIN_QUANTITY,
        }
    }

    /// Set the initial quantity (clamped).
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = clamp_quantity(quantity);
        self
    }

    /// Price of this line (unit price × quantity).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// The shopping cart and its side-panel visibility flag.
///
/// Deserializing goes through the same rules as [`Cart::add`], so a stored
/// cart with out-of-range quantities or duplicate lines loads normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredCart")]
pub struct Cart {
    items: Vec<CartItem>,
    is_open: bool,
}

/// Cart as persisted, before the quantity rules are applied.
#[derive(Deserialize)]
struct StoredCart {
    items: Vec<CartItem>,
    #[serde(default)]
    is_open: bool,
}

impl From<StoredCart> for Cart {
    fn from(stored: StoredCart) -> Self {
        let mut cart = Self {
            items: Vec::with_capacity(stored.items.len()),
            is_open: stored.is_open,
        };
        for item in stored.items {
            if item.quantity >= MIN_QUANTITY {
                cart.add(item);
            }
        }
        cart
    }
}

impl Cart {
    /// Create an empty, closed cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            is_open: false,
        }
    }

    /// Add a product, or increment its quantity if it is already in the cart.
    ///
    /// The resulting quantity is capped at [`MAX_QUANTITY`].
    pub fn add(&mut self, item: CartItem) {
        let quantity = clamp_quantity(item.quantity);

        if let Some(existing) = self.items.iter_mut().find(|line| line.id == item.id) {
            existing.quantity = existing.quantity.saturating_add(quantity).min(MAX_QUANTITY);
            return;
        }

        self.items.push(CartItem { quantity, ..item });
    }

    /// Set the quantity of a line.
    ///
    /// A quantity below [`MIN_QUANTITY`] removes the line; a quantity above
    /// [`MAX_QUANTITY`] is capped. Unknown ids are ignored.
    pub fn update_quantity(&mut self, id: ProductId, quantity: u32) {
        if quantity < MIN_QUANTITY {
            self.remove(id);
            return;
        }

        if let Some(line) = self.items.iter_mut().find(|line| line.id == id) {
            line.quantity = quantity.min(MAX_QUANTITY);
        }
    }

    /// Remove a line. Unknown ids are ignored.
    pub fn remove(&mut self, id: ProductId) {
        self.items.retain(|line| line.id != id);
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    /// Sum of every line's price × quantity.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Show the cart side panel.
    pub fn open(&mut self) {
        self.is_open = true;
    }

    /// Hide the cart side panel.
    pub fn close(&mut self) {
        self.is_open = false;
    }

    /// Whether the cart side panel is visible.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Find a line by product id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|line| line.id == id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn clamp_quantity(quantity: u32) -> u32 {
    quantity.clamp(MIN_QUANTITY, MAX_QUANTITY)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i32, price: i64) -> CartItem {
        CartItem::new(
            ProductId::new(id),
            format!("Part {id}"),
            Price::from_dinars(price),
            None,
        )
    }

    #[test]
    fn test_new_cart_is_empty_and_closed() {
        let cart = Cart::new();
        assert!(cart.is_empty());
        assert!(!cart.is_open());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price(), Price::ZERO);
    }

    #[test]
    fn test_adding_same_product_increments_quantity() {
        let mut cart = Cart::new();
        cart.add(item(1, 1200));
        cart.add(item(1, 1200));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 2);
    }

    #[test]
    fn test_add_keeps_insertion_order() {
        let mut cart = Cart::new();
        cart.add(item(3, 10));
        cart.add(item(1, 10));
        cart.add(item(3, 10));

        let ids: Vec<i32> = cart.items().iter().map(|l| l.id.as_i32()).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn test_add_caps_at_max_quantity() {
        let mut cart = Cart::new();
        cart.add(item(1, 100).with_quantity(8));
        cart.add(item(1, 100).with_quantity(5));
        assert_eq!(cart.total_items(), MAX_QUANTITY);

        for _ in 0..20 {
            cart.add(item(1, 100));
        }
        assert_eq!(cart.total_items(), MAX_QUANTITY);
    }

    #[test]
    fn test_new_line_quantity_is_clamped() {
        let mut cart = Cart::new();
        let mut zero = item(1, 100);
        zero.quantity = 0;
        cart.add(zero);
        cart.add(item(2, 100).with_quantity(50));

        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, MIN_QUANTITY);
        assert_eq!(cart.get(ProductId::new(2)).unwrap().quantity, MAX_QUANTITY);
    }

    #[test]
    fn test_update_quantity_sets_and_caps() {
        let mut cart = Cart::new();
        cart.add(item(1, 100));

        cart.update_quantity(ProductId::new(1), 4);
        assert_eq!(cart.total_items(), 4);

        cart.update_quantity(ProductId::new(1), 99);
        assert_eq!(cart.total_items(), MAX_QUANTITY);
    }

    #[test]
    fn test_update_quantity_to_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add(item(1, 100));
        cart.add(item(2, 100));

        cart.update_quantity(ProductId::new(1), 0);
        assert!(cart.get(ProductId::new(1)).is_none());
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let mut cart = Cart::new();
        cart.add(item(1, 100));
        let before = cart.clone();

        cart.update_quantity(ProductId::new(9), 3);
        cart.remove(ProductId::new(9));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_total_price_is_sum_of_line_totals() {
        let mut cart = Cart::new();
        cart.add(item(1, 1500).with_quantity(2));
        cart.add(item(2, 250).with_quantity(3));
        cart.add(item(3, 99));

        let expected: Price = cart.items().iter().map(CartItem::line_total).sum();
        assert_eq!(cart.total_price(), expected);
        assert_eq!(cart.total_price(), Price::from_dinars(3000 + 750 + 99));
    }

    #[test]
    fn test_clear_and_remove() {
        let mut cart = Cart::new();
        cart.add(item(1, 100));
        cart.add(item(2, 100));

        cart.remove(ProductId::new(1));
        assert_eq!(cart.items().len(), 1);

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_open_close_flag() {
        let mut cart = Cart::new();
        cart.open();
        assert!(cart.is_open());
        cart.close();
        assert!(!cart.is_open());
    }

    #[test]
    fn test_serde_defaults_open_flag() {
        let json = r#"{"items":[{"id":4,"name":"Pump","price":"3200.00","image":null,"quantity":2}]}"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert!(!cart.is_open());
        assert_eq!(cart.total_price(), Price::from_dinars(6400));
    }

    #[test]
    fn test_stored_cart_is_normalized_on_load() {
        let json = r#"{"is_open":true,"items":[
            {"id":1,"name":"Pump","price":"3200","image":null,"quantity":50},
            {"id":2,"name":"Valve","price":"800","image":null,"quantity":0},
            {"id":1,"name":"Pump","price":"3200","image":null,"quantity":1},
            {"id":3,"name":"Gasket","price":"150","image":null,"quantity":4}
        ]}"#;
        let cart: Cart = serde_json::from_str(json).unwrap();

        assert!(cart.is_open());
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, MAX_QUANTITY);
        assert!(cart.get(ProductId::new(2)).is_none());
        assert_eq!(cart.get(ProductId::new(3)).unwrap().quantity, 4);
    }
}
