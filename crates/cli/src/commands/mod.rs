//! Command implementations.
//!
//! Each command talks to the shop API through [`ApiClient`]; cart commands
//! go through the cart session manager so the held cart ID stays valid
//! across invocations.
//!
//! [`ApiClient`]: tienda_storefront::api::ApiClient

pub mod cart;
pub mod products;
pub mod report;

use thiserror::Error;

use tienda_storefront::api::ApiError;
use tienda_storefront::cart_session::CartError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Shop API request failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Input file could not be read.
    #[error("Could not read {path}: {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },

    /// Seed file is not valid YAML for a product list.
    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Command arguments or input were rejected before any request.
    #[error("{0}")]
    InvalidInput(String),

    /// A cart command needs a cart, but none is held.
    #[error("No active cart. Add a product first with `tienda cart add <PRODUCT_ID>`")]
    NoActiveCart,
}
