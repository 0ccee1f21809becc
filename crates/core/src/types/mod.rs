//! Core types for Tienda.
//!
//! This module provides type-safe wrappers for the shop API's domain concepts.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;
pub mod report;

pub use cart::{AddItemRequest, Cart, CartItem, CheckoutReceipt};
pub use id::*;
pub use price::{Price, PriceError};
pub use product::{NewProduct, Product};
pub use report::TopSellingEntry;
