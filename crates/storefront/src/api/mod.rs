//! Client for the shop HTTP API.
//!
//! # Architecture
//!
//! - The shop API is the source of truth for products, carts and orders
//! - No local copies, no caching: every page is a direct API call
//! - JSON over HTTP via `reqwest`, base path `/api`
//!
//! # Example
//!
//! ```rust,ignore
//! use tienda_storefront::api::ApiClient;
//!
//! let client = ApiClient::new("http://localhost:8080/api")?;
//!
//! let products = client.list_products().await?;
//! let cart = client.create_cart().await?;
//! let cart = client
//!     .add_item(&cart.id, &AddItemRequest { product_id: products[0].id.clone(), quantity: 1 })
//!     .await?;
//! ```

mod client;

pub use client::ApiClient;

use thiserror::Error;

/// Maximum number of characters of an error body kept in [`ApiError::Status`].
pub(crate) const ERROR_BODY_LIMIT: usize = 200;

/// Errors that can occur when calling the shop API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered 404 for the referenced resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server answered with any other non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// Response status code.
        status: u16,
        /// Response body (truncated).
        message: String,
    },

    /// The response body was not the JSON we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base URL cannot carry path segments.
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Coarse classification of an [`ApiError`], used to decide on retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network unreachable or unusable response.
    Transport,
    /// The referenced cart or product no longer exists server-side.
    NotFound,
    /// Any other non-success status.
    Server,
}

impl ApiError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Status { .. } => ErrorKind::Server,
            Self::Http(_) | Self::Parse(_) | Self::InvalidBaseUrl(_) => ErrorKind::Transport,
        }
    }

    /// Whether this is a 404 from the server.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
