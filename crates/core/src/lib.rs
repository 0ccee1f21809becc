//! Tienda Core - Shared types library.
//!
//! This crate provides the types shared by every Tienda component:
//! - `storefront` - Web storefront and the shop API client
//! - `cli` - Command-line client for the same API
//! - `integration-tests` - In-process fake of the shop API
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. The shop API
//! owns products, carts and orders; these types are the client's view of the
//! JSON it returns.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, products, carts and report rows

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
