//! Carts as served by the shop API.
//!
//! Carts live on the server. The client holds only a [`CartId`] and reads the
//! server's representation; it never assembles a cart locally.

use serde::{Deserialize, Serialize};

use super::id::{CartId, ProductId};
use super::price::Price;

/// A line in a cart.
///
/// `price` is the unit price the server captured when the product was added,
/// not the product's current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Price,
}

impl CartItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.price * self.quantity
    }
}

/// A server-side shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total: Price,
}

impl Cart {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Request body for adding a product to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Response body of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CheckoutReceipt {
    #[serde(default)]
    pub message: String,
}

/// The API encodes an empty item list as `null` for some carts.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<CartItem>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Vec<CartItem>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_deserializes_api_shape() {
        let json = r#"{
            "id": "c1",
            "items": [
                {"productId": "p1", "quantity": 2, "price": 12.5},
                {"productId": "p2", "quantity": 1, "price": 3}
            ],
            "total": 28
        }"#;
        let cart: Cart = serde_json::from_str(json).unwrap();

        assert_eq!(cart.id, CartId::new("c1"));
        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.total, Price::from_cents(2800));
        assert_eq!(cart.items[0].subtotal(), Price::from_cents(2500));
    }

    #[test]
    fn test_cart_null_items_is_empty() {
        let cart: Cart = serde_json::from_str(r#"{"id":"c9","items":null,"total":0}"#).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_add_item_request_uses_camel_case() {
        let body = AddItemRequest {
            product_id: ProductId::new("p1"),
            quantity: 1,
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"productId":"p1","quantity":1}"#
        );
    }
}
