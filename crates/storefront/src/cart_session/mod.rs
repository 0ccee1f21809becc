//! Cart session management.
//!
//! The shop API owns carts; the client owns only the identifier of the cart it
//! is currently filling. [`CartSessionManager`] is the single owner of that
//! identifier: it creates carts on demand, persists the ID through a
//! [`CartIdStore`], and reacts to the server forgetting a cart.
//!
//! # Cart ID lifecycle
//!
//! ```text
//! Absent --(create succeeds)--> Active --(checkout succeeds / 404)--> Absent
//! ```
//!
//! Clearing is compare-and-clear: the held ID is only dropped when it is the
//! ID the consumed or missing cart was addressed by.
//!
//! # Self-heal
//!
//! Adding an item to a cart the server no longer knows discards the stale ID,
//! creates a fresh cart and retries once (see [`RetryPolicy::SELF_HEAL`]).
//! The shop API answers 404 for an unknown product as well, so a 404 is first
//! confirmed with a cart lookup before the cart is thrown away.
//!
//! # Concurrency
//!
//! Operations are not serialized. Two adds fired back to back against a stale
//! cart can both self-heal and end up creating two carts; the last one saved
//! wins. Fixing that needs a per-session request queue.

mod store;

pub use store::{MemoryCartStore, SessionCartStore, StoreError};

use thiserror::Error;
use tracing::{info, instrument, warn};

use tienda_core::{AddItemRequest, Cart, CartId, CheckoutReceipt, ProductId};

use crate::api::{ApiError, ErrorKind};

// =============================================================================
// Seams
// =============================================================================

/// The cart half of the shop API.
///
/// Implemented by [`crate::api::ApiClient`]; tests substitute in-memory fakes.
pub trait CartApi: Send + Sync {
    /// `POST /cart`
    fn create_cart(&self) -> impl Future<Output = Result<Cart, ApiError>> + Send;

    /// `GET /cart/{id}`
    fn get_cart(&self, cart_id: &CartId) -> impl Future<Output = Result<Cart, ApiError>> + Send;

    /// `POST /cart/{id}/add`
    fn add_item(
        &self,
        cart_id: &CartId,
        item: &AddItemRequest,
    ) -> impl Future<Output = Result<Cart, ApiError>> + Send;

    /// `DELETE /cart/{id}/item/{productId}`
    fn remove_item(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<Cart, ApiError>> + Send;

    /// `POST /cart/{id}/checkout`
    fn checkout(
        &self,
        cart_id: &CartId,
    ) -> impl Future<Output = Result<CheckoutReceipt, ApiError>> + Send;
}

/// Durable client-side storage for the current cart ID.
///
/// Holds at most one ID. Only [`CartSessionManager`] writes to it.
pub trait CartIdStore: Send + Sync {
    /// Read the held cart ID, if any.
    fn load(&self) -> impl Future<Output = Result<Option<CartId>, StoreError>> + Send;

    /// Replace the held cart ID.
    fn save(&self, cart_id: &CartId) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Forget the held cart ID.
    fn clear(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

// =============================================================================
// Retry Policy
// =============================================================================

/// A bounded retry policy keyed on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// The only error kind that is retried.
    pub retry_on: ErrorKind,
}

impl RetryPolicy {
    /// Recreate the cart and retry once when it was not found.
    pub const SELF_HEAL: Self = Self {
        max_retries: 1,
        retry_on: ErrorKind::NotFound,
    };

    /// Never retry.
    pub const NEVER: Self = Self {
        max_retries: 0,
        retry_on: ErrorKind::NotFound,
    };

    /// Whether a failed attempt should be retried, given how many retries
    /// have already been made.
    #[must_use]
    pub fn should_retry(&self, error: &ApiError, retries_so_far: u32) -> bool {
        retries_so_far < self.max_retries && error.kind() == self.retry_on
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::SELF_HEAL
    }
}

// =============================================================================
// Errors & Results
// =============================================================================

/// Errors surfaced by [`CartSessionManager`] operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The shop API call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The cart ID could not be read or written.
    #[error("Cart storage error: {0}")]
    Store(#[from] StoreError),

    /// The cart exists but the product being added does not.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),
}

impl CartError {
    /// Whether the failure was a 404 from the shop API.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        match self {
            Self::Api(err) => err.is_not_found(),
            Self::ProductNotFound(_) => true,
            Self::Store(_) => false,
        }
    }
}

/// Result of loading a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartState {
    /// The server returned the cart (it may still have no lines).
    Active(Cart),
    /// No cart is held, or the held one no longer exists.
    Empty,
}

impl CartState {
    /// The cart, if there is one with at least one line.
    #[must_use]
    pub fn into_non_empty(self) -> Option<Cart> {
        match self {
            Self::Active(cart) if !cart.is_empty() => Some(cart),
            _ => None,
        }
    }
}

// =============================================================================
// CartSessionManager
// =============================================================================

/// Mediates every cart operation between the UI and the shop API.
#[derive(Debug, Clone)]
pub struct CartSessionManager<A, S> {
    api: A,
    store: S,
    policy: RetryPolicy,
}

impl<A: CartApi, S: CartIdStore> CartSessionManager<A, S> {
    /// Create a manager with the self-heal retry policy.
    #[must_use]
    pub fn new(api: A, store: S) -> Self {
        Self {
            api,
            store,
            policy: RetryPolicy::SELF_HEAL,
        }
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_policy(self, policy: RetryPolicy) -> Self {
        Self { policy, ..self }
    }

    /// The API this manager talks to.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// The store holding the cart ID.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The currently held cart ID, without touching the API.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Store` if the store cannot be read.
    pub async fn current(&self) -> Result<Option<CartId>, CartError> {
        Ok(self.store.load().await?)
    }

    /// Return the held cart ID, creating and persisting a new cart if none is
    /// held.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Api` if the cart cannot be created, or
    /// `CartError::Store` if the ID cannot be persisted.
    #[instrument(skip(self))]
    pub async fn ensure_cart(&self) -> Result<CartId, CartError> {
        if let Some(cart_id) = self.store.load().await? {
            return Ok(cart_id);
        }

        let cart = self.api.create_cart().await?;
        self.store.save(&cart.id).await?;
        info!(cart_id = %cart.id, "Created cart");
        Ok(cart.id)
    }

    /// Add a product to the held cart, creating one if needed.
    ///
    /// If the held cart turns out to be gone server-side, it is discarded,
    /// a fresh cart is created and the add is retried according to the retry
    /// policy (once, by default).
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the cart exists but the product
    /// does not, `CartError::Api` if the add still fails after the allowed
    /// retries, or `CartError::Store` on storage failures.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(&self, product_id: &ProductId, quantity: u32) -> Result<Cart, CartError> {
        let item = AddItemRequest {
            product_id: product_id.clone(),
            quantity,
        };

        let mut cart_id = self.ensure_cart().await?;
        let mut retries = 0;

        loop {
            let error = match self.api.add_item(&cart_id, &item).await {
                Ok(cart) => return Ok(cart),
                Err(error) => error,
            };

            if error.is_not_found() {
                if self.cart_exists(&cart_id).await? {
                    return Err(CartError::ProductNotFound(product_id.clone()));
                }
                self.discard(&cart_id).await?;
            }

            if !self.policy.should_retry(&error, retries) {
                return Err(error.into());
            }

            warn!(cart_id = %cart_id, error = %error, "Cart is stale, retrying with a new cart");
            cart_id = self.ensure_cart().await?;
            retries += 1;
        }
    }

    /// Remove a product's line from a cart.
    ///
    /// No self-heal: a missing cart or line is reported to the caller.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Api` if the API call fails.
    #[instrument(skip(self), fields(cart_id = %cart_id, product_id = %product_id))]
    pub async fn remove_item(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
    ) -> Result<Cart, CartError> {
        Ok(self.api.remove_item(cart_id, product_id).await?)
    }

    /// Check out a cart and stop holding it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Api` if the checkout fails. A 404 still clears the
    /// held ID, since that cart can never be used again.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn checkout(&self, cart_id: &CartId) -> Result<CheckoutReceipt, CartError> {
        match self.api.checkout(cart_id).await {
            Ok(receipt) => {
                self.discard(cart_id).await?;
                info!("Checkout complete");
                Ok(receipt)
            }
            Err(error) => {
                if error.is_not_found() {
                    self.discard(cart_id).await?;
                }
                Err(error.into())
            }
        }
    }

    /// Load a cart. A cart the server no longer knows is reported as
    /// [`CartState::Empty`] and stops being held.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Api` for failures other than 404.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn load_cart(&self, cart_id: &CartId) -> Result<CartState, CartError> {
        match self.api.get_cart(cart_id).await {
            Ok(cart) => Ok(CartState::Active(cart)),
            Err(error) if error.is_not_found() => {
                self.discard(cart_id).await?;
                Ok(CartState::Empty)
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Load the held cart, or [`CartState::Empty`] when none is held.
    ///
    /// # Errors
    ///
    /// See [`Self::load_cart`].
    pub async fn load_current(&self) -> Result<CartState, CartError> {
        match self.store.load().await? {
            Some(cart_id) => self.load_cart(&cart_id).await,
            None => Ok(CartState::Empty),
        }
    }

    /// Whether the server still knows the cart.
    async fn cart_exists(&self, cart_id: &CartId) -> Result<bool, CartError> {
        match self.api.get_cart(cart_id).await {
            Ok(_) => Ok(true),
            Err(error) if error.is_not_found() => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    /// Stop holding `cart_id`. A different held ID is left alone.
    async fn discard(&self, cart_id: &CartId) -> Result<(), CartError> {
        if self.store.load().await?.as_ref() == Some(cart_id) {
            self.store.clear().await?;
            info!(cart_id = %cart_id, "Discarded cart id");
        }
        Ok(())
    }
}
