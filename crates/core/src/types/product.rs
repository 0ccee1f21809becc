//! Products as served by the shop API.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// A product owned by the shop API.
///
/// The client only displays `stock`; the server adjusts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub stock: i64,
}

/// Request body for creating or replacing a product.
///
/// The server assigns the ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub stock: i64,
}

impl NewProduct {
    /// Build the product the server would return for this request.
    #[must_use]
    pub fn with_id(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
        }
    }
}
